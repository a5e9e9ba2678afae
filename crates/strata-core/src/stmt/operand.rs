use super::{Type, Value};

/// A bound reference to a schema field, carried by filter/projection/order
/// lists so the serializer can splice the table alias in at emission time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Logical field name
    pub name: String,

    /// Physical SQL expression; `{}` stands for the table alias
    pub sql: String,

    /// Declared data type
    pub ty: Type,
}

impl FieldRef {
    /// The physical expression with the alias placeholder filled in.
    pub fn aliased(&self, alias: &str) -> String {
        self.sql.replace("{}", alias)
    }

    /// The bare column name, when the physical expression is a plain
    /// aliased column rather than a computed expression.
    pub fn plain_column(&self) -> Option<&str> {
        let rest = self.sql.strip_prefix("{}.")?;
        if rest.contains(|c: char| !c.is_alphanumeric() && c != '_') {
            return None;
        }
        Some(rest)
    }

    /// True when the physical expression is just the logical name and a
    /// select projection needs no `AS` alias.
    pub fn is_trivial(&self) -> bool {
        self.plain_column() == Some(self.name.as_str())
    }
}

/// One side of a comparison, or one entry in an order list.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A bound field reference
    Field(FieldRef),

    /// A literal value, bound as a parameter
    Value(Value),

    /// An opaque SQL fragment; validation is explicitly opted out of and
    /// the caller is solely responsible for escaping
    Raw(String),
}

impl Operand {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

impl From<FieldRef> for Operand {
    fn from(src: FieldRef) -> Self {
        Self::Field(src)
    }
}

impl From<Value> for Operand {
    fn from(src: Value) -> Self {
        Self::Value(src)
    }
}

impl From<&str> for Operand {
    fn from(src: &str) -> Self {
        Self::Value(Value::from(src))
    }
}

impl From<i64> for Operand {
    fn from(src: i64) -> Self {
        Self::Value(Value::I64(src))
    }
}
