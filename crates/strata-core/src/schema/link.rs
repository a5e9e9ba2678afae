use super::PermissionSet;

/// A resolved one-to-many subtable link.
#[derive(Debug, Clone)]
pub struct Link {
    /// Logical link name
    pub name: String,

    /// Target entity type
    pub entity: String,

    /// Field on the owning entity providing the parent side of the join
    /// predicate
    pub local_field: String,

    /// Field on the target entity filtered by the parent's value
    pub remote_field: String,

    pub permissions: PermissionSet,
}
