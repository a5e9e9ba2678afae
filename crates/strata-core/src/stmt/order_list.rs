use super::{Direction, Operand};

/// One `ORDER BY` / `GROUP BY` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntry {
    pub operand: Operand,
    pub direction: Direction,
}

/// An ordered sequence of (field-or-raw, direction) pairs.
///
/// Insertion at an arbitrary index is supported; subsequent entries shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderList {
    items: Vec<OrderEntry>,
}

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operand: impl Into<Operand>, direction: Direction) {
        self.items.push(OrderEntry {
            operand: operand.into(),
            direction,
        });
    }

    pub fn insert(&mut self, index: usize, operand: impl Into<Operand>, direction: Direction) {
        let index = index.min(self.items.len());
        self.items.insert(
            index,
            OrderEntry {
                operand: operand.into(),
                direction,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderEntry> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_shifts_entries() {
        let mut list = OrderList::new();
        list.push(Operand::raw("a"), Direction::Asc);
        list.push(Operand::raw("c"), Direction::Desc);
        list.insert(1, Operand::raw("b"), Direction::Asc);

        let names: Vec<_> = list
            .iter()
            .map(|entry| match &entry.operand {
                Operand::Raw(sql) => sql.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, ["a", "b", "c"]);

        // Out-of-range index appends
        list.insert(99, Operand::raw("d"), Direction::Asc);
        assert_eq!(list.len(), 4);
    }
}
