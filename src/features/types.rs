//! Abstract value kinds and casting.
//!
//! Declared parameters carry one of a small set of abstract types. Incoming
//! argument values are cast to the declared type before an invocable runs,
//! so handlers can rely on the shape of what they receive. Casting is
//! best-effort with explicit failure: a value that cannot be coerced produces
//! a [`CastError`], never a silent default.

use serde_json::{Number, Value};

use super::error::CastError;

/// The abstract value kinds a parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstractType {
    /// UTF-8 text.
    String,
    /// Floating-point number.
    Number,
    /// Whole number.
    Integer,
    /// True or false.
    Boolean,
    /// Ordered list of values.
    Array,
    /// String-keyed map of values.
    Object,
    /// The null value.
    Null,
}

impl AbstractType {
    /// Returns the JSON Schema type name used in wire schemas.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    /// Returns the abstract kind of a JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

impl std::fmt::Display for AbstractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String spellings accepted as `true` by the boolean cast.
const TRUE_WORDS: [&str; 4] = ["true", "1", "yes", "on"];

/// String spellings accepted as `false` by the boolean cast.
const FALSE_WORDS: [&str; 4] = ["false", "0", "no", "off"];

/// Casts a JSON value to the given abstract type.
///
/// Numeric strings parse into integers and numbers (`"3.5"` is not an
/// integer); floats truncate toward zero when cast to integer; booleans
/// accept only the documented word sets, case-insensitively, and an
/// unrecognised spelling is an error, not `false`. Arrays and objects
/// accept JSON text. Strings render any value canonically. Null matches
/// only null itself or the literal string `"null"`.
///
/// # Errors
///
/// Returns a [`CastError`] describing the offending value and the target
/// type when no coercion applies.
pub fn cast(value: &Value, target: AbstractType) -> Result<Value, CastError> {
    match target {
        AbstractType::String => Ok(cast_to_string(value)),
        AbstractType::Integer => cast_to_integer(value),
        AbstractType::Number => cast_to_number(value),
        AbstractType::Boolean => cast_to_boolean(value),
        AbstractType::Array => cast_to_container(value, AbstractType::Array),
        AbstractType::Object => cast_to_container(value, AbstractType::Object),
        AbstractType::Null => cast_to_null(value),
    }
}

/// Renders any JSON value as a string.
///
/// Strings pass through; numbers and booleans render canonically; arrays
/// and objects render as compact JSON text; null renders as `"null"`.
#[must_use]
pub fn cast_to_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        // Display for Value is compact JSON, which covers every other kind.
        other => Value::String(other.to_string()),
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)] // Bounds checked first
fn cast_to_integer(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            if let Some(u) = n.as_u64() {
                return Ok(Value::from(u));
            }
            // Fractional input truncates toward zero, matching a plain
            // float-to-int conversion.
            match n.as_f64() {
                Some(f) if f.trunc() >= i64::MIN as f64 && f.trunc() <= i64::MAX as f64 => {
                    Ok(Value::from(f.trunc() as i64))
                }
                _ => Err(CastError::new(value, AbstractType::Integer)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| CastError::new(value, AbstractType::Integer)),
        _ => Err(CastError::new(value, AbstractType::Integer)),
    }
}

fn cast_to_number(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| CastError::new(value, AbstractType::Number)),
        _ => Err(CastError::new(value, AbstractType::Number)),
    }
}

fn cast_to_boolean(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => {
            let word = s.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(CastError::new(value, AbstractType::Boolean))
            }
        }
        _ => Err(CastError::new(value, AbstractType::Boolean)),
    }
}

fn cast_to_container(value: &Value, target: AbstractType) -> Result<Value, CastError> {
    if AbstractType::of(value) == target {
        return Ok(value.clone());
    }
    if let Value::String(s) = value {
        if let Ok(parsed) = serde_json::from_str::<Value>(s) {
            if AbstractType::of(&parsed) == target {
                return Ok(parsed);
            }
        }
    }
    Err(CastError::new(value, target))
}

fn cast_to_null(value: &Value) -> Result<Value, CastError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) if s.trim().eq_ignore_ascii_case("null") => Ok(Value::Null),
        _ => Err(CastError::new(value, AbstractType::Null)),
    }
}
