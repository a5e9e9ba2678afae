use super::{Flavor, Formatter, ToSql};

use strata_core::stmt::{Type, Value};

pub trait Params {
    fn push(&mut self, value: &Value, ty: Type) -> Placeholder;
}

/// A bind position, 1-based.
pub struct Placeholder(pub usize);

/// Collects bind values alongside their declared types, so the caller can
/// coerce positionally before execution.
#[derive(Debug, Default)]
pub struct TypedParams {
    pub values: Vec<Value>,
    pub types: Vec<Type>,
}

impl Params for TypedParams {
    fn push(&mut self, value: &Value, ty: Type) -> Placeholder {
        self.values.push(value.clone());
        self.types.push(ty);
        Placeholder(self.values.len())
    }
}

impl Params for Vec<Value> {
    fn push(&mut self, value: &Value, _ty: Type) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}

impl ToSql for Placeholder {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        use std::fmt::Write;

        match f.serializer.flavor() {
            Flavor::Mysql => f.dst.push('?'),
            Flavor::Oracle => write!(f.dst, ":{}", self.0).unwrap(),
        }
    }
}
