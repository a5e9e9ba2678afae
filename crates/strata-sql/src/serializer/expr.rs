use super::{Comma, Formatter, Params, ToSql};

use strata_core::stmt::{
    OrderEntry, OrderList, Operand, Printable, Type, Value, WhereItem, WhereList, WherePart,
};

/// A value spliced into the SQL verbatim; the explicit opt-out from
/// parameter binding.
pub(crate) struct Literal<'a>(pub(crate) &'a Value);

impl ToSql for Literal<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.0 {
            Value::Null => f.dst.push_str("NULL"),
            value => f.dst.push_str(&value.render()),
        }
    }
}

/// One side of a comparison, with its escape flag and the type hint taken
/// from the opposite side when that side is a field.
pub(crate) struct Side<'a> {
    pub(crate) operand: &'a Operand,
    pub(crate) escape: bool,
    pub(crate) hint: Option<Type>,
}

impl ToSql for Side<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.operand {
            Operand::Field(field) => {
                let sql = field.aliased(&f.alias);
                fmt!(f, sql);
            }
            Operand::Raw(sql) => fmt!(f, sql),
            Operand::Value(value) if !self.escape => fmt!(f, Literal(value)),
            Operand::Value(value) => {
                let ty = self.hint.unwrap_or_else(|| infer_type(value));
                let placeholder = f.params.push(value, ty);
                fmt!(f, placeholder);
            }
        }
    }
}

impl ToSql for &WherePart {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let hint = |operand: &Operand| match operand {
            Operand::Field(field) => Some(field.ty),
            _ => None,
        };
        let lhs = Side {
            operand: &self.lhs,
            escape: self.escape_lhs,
            hint: hint(&self.rhs),
        };
        let rhs = Side {
            operand: &self.rhs,
            escape: self.escape_rhs,
            hint: hint(&self.lhs),
        };

        fmt!(f, "(" lhs " " self.op.as_str() " " rhs ")");
    }
}

impl ToSql for &WhereList {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let mut s = "";
        for item in self.items() {
            fmt!(f, s);
            match item {
                WhereItem::Part(part) => fmt!(f, part),
                WhereItem::Nested(list) => fmt!(f, "(" list ")"),
                WhereItem::Logic(op) => fmt!(f, op.as_str()),
            }
            s = " ";
        }
    }
}

impl ToSql for &Printable {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Printable::Field(field) => {
                let sql = field.aliased(&f.alias);
                fmt!(f, sql);
            }
            Printable::Raw(sql) => fmt!(f, sql),
        }
    }
}

/// One select-projection entry, optionally re-aliased.
pub(crate) struct SelectItem<'a> {
    pub(crate) expr: &'a Printable,
    pub(crate) alias: Option<&'a str>,
}

impl ToSql for SelectItem<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let alias = self.alias.map(|alias| (" AS ", alias));
        fmt!(f, self.expr alias);
    }
}

impl ToSql for &OrderEntry {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let operand = Side {
            operand: &self.operand,
            escape: true,
            hint: None,
        };
        fmt!(f, operand " " self.direction.as_str());
    }
}

impl ToSql for &OrderList {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Comma(self.iter()));
    }
}

pub(crate) fn infer_type(value: &Value) -> Type {
    match value {
        Value::Bool(_) => Type::Boolean,
        Value::I64(_) => Type::Integer,
        Value::F64(_) => Type::Float,
        Value::Decimal(_) => Type::Decimal,
        Value::Date(_) => Type::Date,
        Value::Time(_) => Type::Time,
        Value::Timestamp(_) => Type::Timestamp,
        Value::Blob(_) => Type::Blob,
        _ => Type::Text,
    }
}
