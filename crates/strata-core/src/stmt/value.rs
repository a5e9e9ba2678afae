use super::Type;
use crate::{Error, Result};

use indexmap::IndexMap;

#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// Exact decimal, kept as its textual representation
    Decimal(String),

    /// String value
    String(String),

    /// Calendar date, `YYYY-MM-DD`
    Date(String),

    /// Time of day, `HH:MM:SS`
    Time(String),

    /// Date and time, `YYYY-MM-DD HH:MM:SS`
    Timestamp(String),

    /// Large object
    Blob(Vec<u8>),

    /// A list of values; produced by `collect()` for subtables
    List(Vec<Value>),

    /// A named record; produced by `collect()` for entities
    Record(IndexMap<String, Value>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True when this value counts as "empty" for identity-cache purposes.
    /// Entities whose whole key is empty are never cached as instances.
    pub fn is_empty_key(&self) -> bool {
        match self {
            Self::Null => true,
            Self::I64(v) => *v == 0,
            Self::String(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Self::I64(v) => Ok(*v),
            _ => Err(Error::type_conversion(format!("{self:?}"), Type::Integer)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::Date(v) | Self::Time(v) | Self::Timestamp(v)
            | Self::Decimal(v) => Some(v),
            _ => None,
        }
    }

    /// Render the value for use as part of an identity-cache key token or a
    /// display template.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(v) => (if *v { "1" } else { "0" }).to_string(),
            Self::I64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::Decimal(v)
            | Self::String(v)
            | Self::Date(v)
            | Self::Time(v)
            | Self::Timestamp(v) => v.clone(),
            Self::Blob(_) | Self::List(_) | Self::Record(_) => String::new(),
        }
    }

    /// Coerce the value to its declared bind type.
    ///
    /// Repeated or overlapping placeholders used to resolve to the wrong
    /// inferred type; positional coercion through the recorded type list is
    /// what prevents that. Null passes through untouched.
    pub fn coerce(self, ty: Type) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }

        let fail = |value: &Value| Err(Error::type_conversion(format!("{value:?}"), ty));

        Ok(match ty {
            Type::Integer => match self {
                Self::I64(v) => Self::I64(v),
                Self::Bool(v) => Self::I64(v as i64),
                Self::String(v) => match v.trim().parse::<i64>() {
                    Ok(n) => Self::I64(n),
                    Err(_) => return fail(&Self::String(v)),
                },
                other => return fail(&other),
            },
            Type::Boolean => match self {
                Self::Bool(v) => Self::Bool(v),
                Self::I64(0) => Self::Bool(false),
                Self::I64(1) => Self::Bool(true),
                Self::String(v) => match v.as_str() {
                    "0" | "false" => Self::Bool(false),
                    "1" | "true" => Self::Bool(true),
                    _ => return fail(&Self::String(v)),
                },
                other => return fail(&other),
            },
            Type::Float => match self {
                Self::F64(v) => Self::F64(v),
                Self::I64(v) => Self::F64(v as f64),
                Self::String(v) => match v.trim().parse::<f64>() {
                    Ok(n) => Self::F64(n),
                    Err(_) => return fail(&Self::String(v)),
                },
                other => return fail(&other),
            },
            Type::Decimal => match self {
                Self::Decimal(v) => Self::Decimal(v),
                Self::I64(v) => Self::Decimal(v.to_string()),
                Self::F64(v) => Self::Decimal(v.to_string()),
                Self::String(v) => match v.trim().parse::<f64>() {
                    Ok(_) => Self::Decimal(v),
                    Err(_) => return fail(&Self::String(v)),
                },
                other => return fail(&other),
            },
            Type::Text => match self {
                Self::String(v) => Self::String(v),
                Self::I64(v) => Self::String(v.to_string()),
                Self::F64(v) => Self::String(v.to_string()),
                Self::Bool(v) => Self::String((if v { "1" } else { "0" }).to_string()),
                Self::Decimal(v) | Self::Date(v) | Self::Time(v) | Self::Timestamp(v) => {
                    Self::String(v)
                }
                other => return fail(&other),
            },
            Type::Date => match self {
                Self::Date(v) | Self::String(v) => Self::Date(v),
                other => return fail(&other),
            },
            Type::Time => match self {
                Self::Time(v) | Self::String(v) => Self::Time(v),
                other => return fail(&other),
            },
            Type::Timestamp => match self {
                Self::Timestamp(v) | Self::String(v) => Self::Timestamp(v),
                other => return fail(&other),
            },
            Type::Blob => match self {
                Self::Blob(v) => Self::Blob(v),
                Self::String(v) => Self::Blob(v.into_bytes()),
                other => return fail(&other),
            },
        })
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn coerce_string_to_integer() {
        let v = Value::from("42").coerce(Type::Integer).unwrap();
        assert_eq!(v, Value::I64(42));

        let err = Value::from("forty-two").coerce(Type::Integer).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn null_passes_through_every_type() {
        for ty in [Type::Integer, Type::Text, Type::Date, Type::Blob] {
            assert_eq!(Value::Null.coerce(ty).unwrap(), Value::Null);
        }
    }

    #[test]
    fn empty_key_detection() {
        assert!(Value::Null.is_empty_key());
        assert!(Value::I64(0).is_empty_key());
        assert!(Value::from("").is_empty_key());
        assert!(!Value::I64(7).is_empty_key());
    }
}
