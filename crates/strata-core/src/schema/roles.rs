use std::collections::BTreeSet;

/// The set of role tokens granted to the evaluating caller.
///
/// Kept sorted so the set can serve as an invalidation key for memoized
/// entity type definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoleSet {
    tokens: BTreeSet<String>,
}

impl RoleSet {
    /// The universal token every caller holds.
    pub const UNIVERSAL: &'static str = "all";

    /// Additional token granted to batch/cron callers.
    pub const CRON: &'static str = "cron";

    /// An unauthenticated caller: `{all}`.
    pub fn anonymous() -> Self {
        let mut roles = Self::default();
        roles.grant(Self::UNIVERSAL);
        roles
    }

    /// A batch/cron caller: `{all, cron}`.
    pub fn cron() -> Self {
        let mut roles = Self::anonymous();
        roles.grant(Self::CRON);
        roles
    }

    /// An authenticated caller with the given roles, plus the universal
    /// token.
    pub fn authenticated<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::anonymous();
        for role in roles {
            set.grant(role);
        }
        set
    }

    pub fn grant(&mut self, role: impl Into<String>) {
        self.tokens.insert(role.into());
    }

    pub fn contains(&self, role: &str) -> bool {
        self.tokens.contains(role)
    }

    pub fn intersects(&self, tokens: &BTreeSet<String>) -> bool {
        self.tokens.iter().any(|token| tokens.contains(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_role_sets() {
        assert!(RoleSet::anonymous().contains("all"));
        assert!(!RoleSet::anonymous().contains("cron"));
        assert!(RoleSet::cron().contains("all"));
        assert!(RoleSet::cron().contains("cron"));

        let user = RoleSet::authenticated(["admin"]);
        assert!(user.contains("all"));
        assert!(user.contains("admin"));
    }
}
