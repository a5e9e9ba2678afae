use crate::Error;

use std::{fmt, str::FromStr};

/// The closed whitelist of comparison operators.
///
/// Anything outside this set is rejected when parsed; filter lists are
/// trusted inputs to SQL generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Like => "LIKE",
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self, Error> {
        Ok(match src {
            "=" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "LIKE" | "like" => Self::Like,
            _ => return Err(Error::invalid_operator(src)),
        })
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_whitelist() {
        assert_eq!("=".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("<>".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert_eq!("LIKE".parse::<CompareOp>().unwrap(), CompareOp::Like);

        for bad in ["==", "IN", "BETWEEN", "; DROP TABLE users"] {
            assert!(bad.parse::<CompareOp>().unwrap_err().is_query_shape());
        }
    }
}
