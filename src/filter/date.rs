//! Date fragments to UTC epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a date literal as used by `date '...'`.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS[.fff]]]` (space or `T`),
/// `YYYY/MM/DD`, `MM/DD/YYYY`, `YYYY-MM` and `YYYY`. Values without an
/// offset are taken as UTC. Returns `None` if no fragment matches.
#[must_use]
pub fn parse_date_millis(input: &str) -> Option<i64> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ndt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return midnight_millis(date);
        }
    }
    partial_date(s).and_then(midnight_millis)
}

/// `YYYY-MM` or `YYYY`, resolved to the first day.
fn partial_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.splitn(2, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None if s.len() == 4 => 1,
        None => return None,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn midnight_millis(date: NaiveDate) -> Option<i64> {
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM:SS[.fff]` in UTC.
#[must_use]
pub fn format_date_millis(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAN_2_2020: i64 = 1_577_923_200_000;

    #[test]
    fn plain_date() {
        assert_eq!(parse_date_millis("2020-01-02"), Some(JAN_2_2020));
        assert_eq!(parse_date_millis("2020/01/02"), Some(JAN_2_2020));
        assert_eq!(parse_date_millis("01/02/2020"), Some(JAN_2_2020));
    }

    #[test]
    fn date_time_variants() {
        let expected = JAN_2_2020 + 3_600_000 + 60_000 + 1_000;
        assert_eq!(parse_date_millis("2020-01-02 01:01:01"), Some(expected));
        assert_eq!(parse_date_millis("2020-01-02T01:01:01"), Some(expected));
        assert_eq!(parse_date_millis("2020-01-02T01:01:01Z"), Some(expected));
        assert_eq!(
            parse_date_millis("2020-01-02 01:01:01.250"),
            Some(expected + 250)
        );
        assert_eq!(
            parse_date_millis("2020-01-02 01:01"),
            Some(expected - 1_000)
        );
    }

    #[test]
    fn offsets_are_honored() {
        assert_eq!(
            parse_date_millis("2020-01-02T01:00:00+01:00"),
            Some(JAN_2_2020)
        );
    }

    #[test]
    fn partial_fragments() {
        assert_eq!(parse_date_millis("2020-01"), Some(1_577_836_800_000));
        assert_eq!(parse_date_millis("2020"), Some(1_577_836_800_000));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_date_millis("yesterday"), None);
        assert_eq!(parse_date_millis("2020-13"), None);
        assert_eq!(parse_date_millis(""), None);
        assert_eq!(parse_date_millis("20"), None);
    }

    #[test]
    fn format_round_trips() {
        assert_eq!(
            format_date_millis(JAN_2_2020).as_deref(),
            Some("2020-01-02 00:00:00")
        );
        let with_millis = JAN_2_2020 + 1_250;
        let text = format_date_millis(with_millis).unwrap();
        assert_eq!(text, "2020-01-02 00:00:01.250");
        assert_eq!(parse_date_millis(&text), Some(with_millis));
    }
}
