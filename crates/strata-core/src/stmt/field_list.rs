use super::FieldRef;

/// One entry in a select projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Printable {
    /// A bound field definition
    Field(FieldRef),

    /// An opaque SQL fragment tagged as not needing further validation
    Raw(String),
}

/// An ordered sequence of printable fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldList {
    items: Vec<Printable>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, field: FieldRef) {
        self.items.push(Printable::Field(field));
    }

    pub fn push_raw(&mut self, sql: impl Into<String>) {
        self.items.push(Printable::Raw(sql.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Printable> {
        self.items.iter()
    }
}

impl FromIterator<FieldRef> for FieldList {
    fn from_iter<I: IntoIterator<Item = FieldRef>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Printable::Field).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Type;

    #[test]
    fn raw_fragments_keep_their_position() {
        let mut list = FieldList::new();
        list.push_field(FieldRef {
            name: "id".to_string(),
            sql: "{}.id".to_string(),
            ty: Type::Integer,
        });
        list.push_raw("COUNT(*)");

        assert_eq!(list.len(), 2);
        assert!(matches!(list.iter().nth(1), Some(Printable::Raw(sql)) if sql == "COUNT(*)"));
    }
}
