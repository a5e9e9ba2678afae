use super::RoleSet;

use std::collections::BTreeSet;

/// The four actions a permission set controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Insert,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Insert => "insert",
            Self::Delete => "delete",
        }
    }
}

/// Four independent sets of role tokens controlling visibility.
///
/// An unset member inherits from the owning table's set; a set that is unset
/// at both levels allows everyone.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    pub read: Option<BTreeSet<String>>,
    pub write: Option<BTreeSet<String>>,
    pub insert: Option<BTreeSet<String>>,
    pub delete: Option<BTreeSet<String>>,
}

impl PermissionSet {
    pub fn new(
        read: Option<BTreeSet<String>>,
        write: Option<BTreeSet<String>>,
        insert: Option<BTreeSet<String>>,
        delete: Option<BTreeSet<String>>,
    ) -> Self {
        Self {
            read,
            write,
            insert,
            delete,
        }
    }

    fn tokens(&self, action: Action) -> Option<&BTreeSet<String>> {
        match action {
            Action::Read => self.read.as_ref(),
            Action::Write => self.write.as_ref(),
            Action::Insert => self.insert.as_ref(),
            Action::Delete => self.delete.as_ref(),
        }
    }

    /// Visibility for a field-level set, inheriting from the owning table's
    /// set when unset.
    pub fn allows(&self, action: Action, roles: &RoleSet, table: &PermissionSet) -> bool {
        match self.tokens(action).or_else(|| table.tokens(action)) {
            Some(tokens) => roles.intersects(tokens),
            None => true,
        }
    }

    /// Visibility for a table-level set; there is nothing to inherit from.
    pub fn allows_table(&self, action: Action, roles: &RoleSet) -> bool {
        match self.tokens(action) {
            Some(tokens) => roles.intersects(tokens),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(roles: &[&str]) -> Option<BTreeSet<String>> {
        Some(roles.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn intersect_or_inherit() {
        let table = PermissionSet::new(tokens(&["admin"]), None, None, None);
        let field_open = PermissionSet::default();
        let field_all = PermissionSet::new(tokens(&["all"]), None, None, None);

        let anon = RoleSet::anonymous();
        let admin = RoleSet::authenticated(["admin"]);

        // Unset field set inherits the table's
        assert!(!field_open.allows(Action::Read, &anon, &table));
        assert!(field_open.allows(Action::Read, &admin, &table));

        // Set field set overrides the table's
        assert!(field_all.allows(Action::Read, &anon, &table));

        // Unset at both levels allows everyone
        assert!(field_open.allows(Action::Write, &anon, &table));
    }

    #[test]
    fn cron_token_matches() {
        let field = PermissionSet::new(tokens(&["cron"]), None, None, None);
        let table = PermissionSet::default();

        assert!(field.allows(Action::Read, &RoleSet::cron(), &table));
        assert!(!field.allows(Action::Read, &RoleSet::anonymous(), &table));
    }
}
