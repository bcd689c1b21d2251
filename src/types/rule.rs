use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::value::Value;

/// The comparison operators a rule can apply to a resolved context value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl ComparisonOp {
    /// Every operator, in wire order.
    pub const ALL: [ComparisonOp; 9] = [
        ComparisonOp::Equals,
        ComparisonOp::NotEquals,
        ComparisonOp::GreaterThan,
        ComparisonOp::LessThan,
        ComparisonOp::Contains,
        ComparisonOp::StartsWith,
        ComparisonOp::EndsWith,
        ComparisonOp::IsEmpty,
        ComparisonOp::IsNotEmpty,
    ];

    /// Unary operators ignore the rule operand entirely.
    #[must_use]
    pub fn is_unary(self) -> bool {
        matches!(self, ComparisonOp::IsEmpty | ComparisonOp::IsNotEmpty)
    }

    /// Binary operators need an operand to compare against.
    #[must_use]
    pub fn requires_value(self) -> bool {
        !self.is_unary()
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComparisonOp::Equals => "equals",
            ComparisonOp::NotEquals => "not_equals",
            ComparisonOp::GreaterThan => "greater_than",
            ComparisonOp::LessThan => "less_than",
            ComparisonOp::Contains => "contains",
            ComparisonOp::StartsWith => "starts_with",
            ComparisonOp::EndsWith => "ends_with",
            ComparisonOp::IsEmpty => "is_empty",
            ComparisonOp::IsNotEmpty => "is_not_empty",
        };
        write!(f, "{name}")
    }
}

/// A single field comparison: resolve `field` against the context, apply
/// `operator` with `value` as the operand.
///
/// The id is a session-local handle assigned by the owning [`Condition`];
/// it is not persisted and is excluded from equality.
///
/// [`Condition`]: super::condition::Condition
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) id: u64,
    pub(crate) field: String,
    pub(crate) operator: ComparisonOp,
    pub(crate) value: Option<Value>,
}

impl Rule {
    /// Create a rule. Operands on unary operators are dropped so the
    /// value is always `None` when the operator ignores it.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: ComparisonOp, value: Option<Value>) -> Self {
        Self {
            id: 0,
            field: field.into(),
            operator,
            value: if operator.is_unary() { None } else { value },
        }
    }

    /// A blank rule as produced by the "add rule" editing action.
    pub(crate) fn draft(id: u64) -> Self {
        Self {
            id,
            field: String::new(),
            operator: ComparisonOp::Equals,
            value: None,
        }
    }

    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::Equals, Some(value.into()))
    }

    #[must_use]
    pub fn not_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::NotEquals, Some(value.into()))
    }

    #[must_use]
    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::GreaterThan, Some(value.into()))
    }

    #[must_use]
    pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::LessThan, Some(value.into()))
    }

    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::Contains, Some(value.into()))
    }

    #[must_use]
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::StartsWith, Some(value.into()))
    }

    #[must_use]
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::EndsWith, Some(value.into()))
    }

    #[must_use]
    pub fn is_empty(field: impl Into<String>) -> Self {
        Self::new(field, ComparisonOp::IsEmpty, None)
    }

    #[must_use]
    pub fn is_not_empty(field: impl Into<String>) -> Self {
        Self::new(field, ComparisonOp::IsNotEmpty, None)
    }

    /// The session-local handle used to address this rule while editing.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Dotted path into the evaluation context.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn operator(&self) -> ComparisonOp {
        self.operator
    }

    /// The operand. Always `None` for unary operators.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Per-rule schema checks, keyed by the offending field of the rule
    /// record itself.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.field.trim().is_empty() {
            errors.push(ValidationError::new("field", "field path must not be empty"));
        }
        if self.operator.requires_value() && self.value.is_none() {
            errors.push(ValidationError::new(
                "value",
                format!("operator '{}' requires a value", self.operator),
            ));
        }
        if let Some(Value::List(_)) = self.value {
            errors.push(ValidationError::new("value", "rule values must be scalars"));
        }
        errors
    }

    pub(crate) fn apply(&mut self, patch: RulePatch) {
        match patch {
            RulePatch::Field(field) => self.field = field,
            RulePatch::Operator(operator) => {
                self.operator = operator;
                if operator.is_unary() {
                    self.value = None;
                }
            }
            RulePatch::Value(value) => {
                if self.operator.requires_value() {
                    self.value = value;
                }
            }
        }
    }
}

/// Equality ignores the session-local id; two rules are equal when they
/// test the same thing.
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.operator == other.operator && self.value == other.value
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {value}", self.field, self.operator),
            None => write!(f, "{} {}", self.field, self.operator),
        }
    }
}

/// A single-field edit applied to a rule in place, as issued by the
/// condition builder UI.
#[derive(Debug, Clone, PartialEq)]
pub enum RulePatch {
    /// Replace the field path.
    Field(String),
    /// Replace the operator; switching to a unary operator clears the operand.
    Operator(ComparisonOp),
    /// Replace the operand; ignored while the operator is unary.
    Value(Option<Value>),
}
