use std::fmt;

use super::rule::ComparisonOp;

/// Dynamic value type shared by rule operands and resolved context data.
///
/// Rule operands built through the editing handlers are always scalars;
/// `Null` and `List` exist because runtime context data is JSON-shaped
/// (absent form fields arrive as `null`, multi-selects as arrays).
#[derive(Debug, Clone)]
pub enum Value {
    /// The JSON `null` leaf.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A list of values.
    List(Vec<Value>),
}

impl Value {
    /// Apply a comparison operator with `self` as the resolved context value
    /// and `operand` as the rule operand.
    ///
    /// Returns `None` when the comparison does not apply (ordering on
    /// non-numbers); callers treat `None` as a failed match.
    #[must_use]
    pub fn compare(&self, op: ComparisonOp, operand: &Value) -> Option<bool> {
        match op {
            ComparisonOp::Equals => Some(self == operand),
            ComparisonOp::NotEquals => Some(self != operand),
            ComparisonOp::GreaterThan => match (self.as_number(), operand.as_number()) {
                (Some(a), Some(b)) => Some(a > b),
                _ => None,
            },
            ComparisonOp::LessThan => match (self.as_number(), operand.as_number()) {
                (Some(a), Some(b)) => Some(a < b),
                _ => None,
            },
            ComparisonOp::Contains => {
                Some(self.coerce_string().contains(&operand.coerce_string()))
            }
            ComparisonOp::StartsWith => {
                Some(self.coerce_string().starts_with(&operand.coerce_string()))
            }
            ComparisonOp::EndsWith => {
                Some(self.coerce_string().ends_with(&operand.coerce_string()))
            }
            // Unary operators look only at the resolved value.
            ComparisonOp::IsEmpty => Some(self.is_empty()),
            ComparisonOp::IsNotEmpty => Some(!self.is_empty()),
        }
    }

    /// Numeric view of this value. Only `Int` and `Float` are numeric;
    /// strings are never parsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String coercion used by the substring operators: strings as-is,
    /// numbers and bools via their display form, `Null` as the empty
    /// string, lists as their coerced elements joined with `','`.
    #[must_use]
    pub fn coerce_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::coerce_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// True for `Null`, the empty string, and the empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Convert a JSON value. Objects have no scalar projection and map to
    /// `Null`; nested objects are handled by the context, not by `Value`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null | serde_json::Value::Object(_) => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
        }
    }

    /// Convert to a JSON value. Non-finite floats serialize as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

/// Structural equality with numbers comparing by value across `Int` and
/// `Float`, consistent with the `equals` operator.
impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
