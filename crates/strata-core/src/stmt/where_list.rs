use super::{CompareOp, LogicOp, Operand};
use crate::{Error, Result};

/// A single comparison: `lhs OP rhs`.
///
/// The escape flags control each side independently; a side with escaping
/// turned off is spliced into the SQL verbatim, which is an explicit opt-out
/// from parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub struct WherePart {
    pub lhs: Operand,
    pub op: CompareOp,
    pub rhs: Operand,
    pub escape_lhs: bool,
    pub escape_rhs: bool,
}

impl WherePart {
    pub fn new(lhs: impl Into<Operand>, op: CompareOp, rhs: impl Into<Operand>) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
            escape_lhs: true,
            escape_rhs: true,
        }
    }

    pub fn eq(lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::new(lhs, CompareOp::Eq, rhs)
    }

    pub fn unescaped_rhs(mut self) -> Self {
        self.escape_rhs = false;
        self
    }

    pub fn unescaped_lhs(mut self) -> Self {
        self.escape_lhs = false;
        self
    }
}

/// One item of a where list.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereItem {
    /// A comparison
    Part(WherePart),

    /// A parenthesized sub-list
    Nested(WhereList),

    /// A logical connective between two comparisons
    Logic(LogicOp),
}

impl WhereItem {
    fn is_logic(&self) -> bool {
        matches!(self, Self::Logic(_))
    }
}

impl From<WherePart> for WhereItem {
    fn from(src: WherePart) -> Self {
        Self::Part(src)
    }
}

impl From<WhereList> for WhereItem {
    fn from(src: WhereList) -> Self {
        Self::Nested(src)
    }
}

impl From<LogicOp> for WhereItem {
    fn from(src: LogicOp) -> Self {
        Self::Logic(src)
    }
}

/// A boolean filter expression: a flat sequence alternating comparisons (or
/// nested lists) and logical operators. The first item is always a
/// comparison; parenthesization is expressed by nesting.
///
/// Operators bind left-to-right exactly as written; the compiler never
/// re-groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereList {
    items: Vec<WhereItem>,
}

impl WhereList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding a single comparison.
    pub fn part(part: WherePart) -> Self {
        Self {
            items: vec![WhereItem::Part(part)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[WhereItem] {
        &self.items
    }

    /// Push a single item, enforcing the alternation contract: items at even
    /// positions must be comparisons or nested lists, items at odd positions
    /// must be logical operators.
    pub fn push(&mut self, item: impl Into<WhereItem>) -> Result<()> {
        let item = item.into();
        self.check_position(self.items.len(), &item)?;
        self.items.push(item);
        Ok(())
    }

    /// Append a run of items.
    ///
    /// Parity contract: appending to a non-empty list must start with a
    /// logical operator and end with a comparison (even count); appending to
    /// an empty list must start with a comparison (odd count). All-or-nothing:
    /// nothing is appended on error.
    pub fn append(&mut self, items: Vec<WhereItem>) -> Result<()> {
        if items.len() % 2 == self.items.len() % 2 {
            return Err(Error::parity(self.items.len(), items.len()));
        }
        for (offset, item) in items.iter().enumerate() {
            self.check_position(self.items.len() + offset, item)?;
        }
        self.items.extend(items);
        Ok(())
    }

    /// Convenience: AND a comparison onto the list, prefixing with the
    /// operator only when the list is non-empty.
    pub fn and(&mut self, part: impl Into<WhereItem>) -> Result<()> {
        if !self.items.is_empty() {
            self.push(LogicOp::And)?;
        }
        self.push(part)
    }

    /// Merge another list in as a nested (parenthesized) group.
    pub fn and_nested(&mut self, other: WhereList) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        self.and(other)
    }

    fn check_position(&self, index: usize, item: &WhereItem) -> Result<()> {
        // An empty nested group would serialize to `()`
        if matches!(item, WhereItem::Nested(list) if list.is_empty()) {
            return Err(Error::query_shape("cannot nest an empty where list"));
        }
        let want_logic = index % 2 == 1;
        if want_logic != item.is_logic() {
            return Err(Error::alternation(
                index,
                if want_logic {
                    "a logical operator"
                } else {
                    "a comparison or nested list"
                },
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Value;

    fn cmp(name: &str) -> WherePart {
        WherePart::eq(Operand::raw(name), Value::I64(1))
    }

    #[test]
    fn append_parity() {
        let mut list = WhereList::new();
        list.append(vec![cmp("a").into()]).unwrap();
        list.append(vec![LogicOp::And.into(), cmp("b").into()])
            .unwrap();
        assert_eq!(list.len(), 3);

        // Even-length run into an empty list
        let mut empty = WhereList::new();
        let err = empty
            .append(vec![LogicOp::Or.into(), cmp("c").into()])
            .unwrap_err();
        assert!(err.is_query_shape());
        assert!(empty.is_empty());

        // Odd-length run into a non-empty list
        let err = list.append(vec![cmp("c").into()]).unwrap_err();
        assert!(err.is_query_shape());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn append_preserves_order() {
        let mut list = WhereList::new();
        list.append(vec![cmp("a").into(), LogicOp::And.into(), cmp("b").into()])
            .unwrap();
        list.append(vec![LogicOp::Or.into(), cmp("c").into()])
            .unwrap();

        let kinds: Vec<_> = list
            .items()
            .iter()
            .map(|item| match item {
                WhereItem::Part(_) => "part",
                WhereItem::Nested(_) => "nested",
                WhereItem::Logic(op) => op.as_str(),
            })
            .collect();
        assert_eq!(kinds, ["part", "AND", "part", "OR", "part"]);
    }

    #[test]
    fn empty_nested_lists_are_rejected() {
        let mut list = WhereList::new();
        assert!(list.push(WhereList::new()).unwrap_err().is_query_shape());

        list.push(cmp("a")).unwrap();
        let err = list
            .append(vec![LogicOp::And.into(), WhereList::new().into()])
            .unwrap_err();
        assert!(err.is_query_shape());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn push_checks_alternation() {
        let mut list = WhereList::new();
        assert!(list.push(LogicOp::And).unwrap_err().is_query_shape());
        list.push(cmp("a")).unwrap();
        assert!(list.push(cmp("b")).unwrap_err().is_query_shape());
        list.push(LogicOp::Or).unwrap();
        list.push(WhereList::part(cmp("c"))).unwrap();
    }
}
