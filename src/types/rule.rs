use super::style::{StyleSettings, TextSettings};
use super::value::{CompareOp, Value};

/// Lower bound operator of a class break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LowerBound {
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Gte,
}

/// Upper bound operator of a class break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpperBound {
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Lte,
}

impl LowerBound {
    #[must_use]
    pub fn op(self) -> CompareOp {
        match self {
            LowerBound::Gt => CompareOp::Gt,
            LowerBound::Gte => CompareOp::Gte,
        }
    }

    #[must_use]
    pub fn is_inclusive(self) -> bool {
        self == LowerBound::Gte
    }
}

impl UpperBound {
    #[must_use]
    pub fn op(self) -> CompareOp {
        match self {
            UpperBound::Lt => CompareOp::Lt,
            UpperBound::Lte => CompareOp::Lte,
        }
    }

    #[must_use]
    pub fn is_inclusive(self) -> bool {
        self == UpperBound::Lte
    }
}

/// Boundary operators of one class break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakConditions {
    pub lower: LowerBound,
    pub upper: UpperBound,
}

impl BreakConditions {
    #[must_use]
    pub const fn new(lower: LowerBound, upper: UpperBound) -> Self {
        Self { lower, upper }
    }

    /// Defaults for breaks without explicit conditions: the first break is
    /// `[>=, <=]`, every later break `[>, <=]`.
    #[must_use]
    pub const fn legacy(index: usize) -> Self {
        if index == 0 {
            Self::new(LowerBound::Gte, UpperBound::Lte)
        } else {
            Self::new(LowerBound::Gt, UpperBound::Lte)
        }
    }

    #[must_use]
    pub fn contains(&self, value: f64, min: f64, max: f64) -> bool {
        let above = value
            .partial_cmp(&min)
            .is_some_and(|ord| self.lower.op().holds(ord));
        let below = value
            .partial_cmp(&max)
            .is_some_and(|ord| self.upper.op().holds(ord));
        above && below
    }
}

/// One entry of a unique-value table. `values` holds one expected value per
/// composite field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UniqueValueRule {
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub values: Vec<Value>,
    #[cfg_attr(feature = "serde", serde(default = "visible_by_default"))]
    pub visible: bool,
    pub settings: StyleSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: Option<TextSettings>,
}

impl UniqueValueRule {
    #[must_use]
    pub fn new(values: Vec<Value>, settings: StyleSettings) -> Self {
        Self {
            label: values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            values,
            visible: true,
            settings,
            text: None,
        }
    }

    /// A catch-all entry for the end of a table with a default.
    #[must_use]
    pub fn default_rule(settings: StyleSettings) -> Self {
        Self {
            label: "Other".to_owned(),
            values: Vec::new(),
            visible: true,
            settings,
            text: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn text(mut self, text: TextSettings) -> Self {
        self.text = Some(text);
        self
    }
}

/// One entry of a class-break table. `conditions` of `None` means the legacy
/// defaults for the rule's position (see [`BreakConditions::legacy`]).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClassBreakRule {
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub conditions: Option<BreakConditions>,
    #[cfg_attr(feature = "serde", serde(default = "visible_by_default"))]
    pub visible: bool,
    pub settings: StyleSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: Option<TextSettings>,
}

impl ClassBreakRule {
    #[must_use]
    pub fn new(min: f64, max: f64, settings: StyleSettings) -> Self {
        Self {
            label: format!("{min} - {max}"),
            min,
            max,
            conditions: None,
            visible: true,
            settings,
            text: None,
        }
    }

    #[must_use]
    pub fn default_rule(settings: StyleSettings) -> Self {
        Self {
            label: "Other".to_owned(),
            ..Self::new(0.0, 0.0, settings)
        }
    }

    #[must_use]
    pub fn conditions(mut self, lower: LowerBound, upper: UpperBound) -> Self {
        self.conditions = Some(BreakConditions::new(lower, upper));
        self
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn text(mut self, text: TextSettings) -> Self {
        self.text = Some(text);
        self
    }

    /// Conditions in effect for this rule at position `index`.
    #[must_use]
    pub fn effective_conditions(&self, index: usize) -> BreakConditions {
        self.conditions
            .unwrap_or_else(|| BreakConditions::legacy(index))
    }
}

#[cfg(feature = "serde")]
fn visible_by_default() -> bool {
    true
}
