mod def;
pub use def::{EntityDef, FieldDef, SubtableDef};

mod entity;
pub use entity::EntityType;

mod field;
pub use field::{Field, LinkTarget};

mod link;
pub use link::Link;

mod permission;
pub use permission::{Action, PermissionSet};

mod roles;
pub use roles::RoleSet;

use crate::{Error, Result};

use indexmap::IndexMap;
use std::{cell::RefCell, collections::HashMap, sync::Arc};

/// The schema registry: raw entity definitions plus resolved entity types
/// memoized for the active caller's role set.
///
/// Permission resolution walks every field and is the most expensive part of
/// object setup, so resolved types are cached and only invalidated when the
/// role set actually changes (rare: e.g. first anonymous request vs.
/// authenticated request).
#[derive(Debug, Default)]
pub struct Schema {
    defs: IndexMap<String, EntityDef>,
    memo: RefCell<Memo>,
}

#[derive(Debug, Default)]
struct Memo {
    roles: RoleSet,
    types: HashMap<String, Arc<EntityType>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity definition.
    pub fn register(&mut self, name: impl Into<String>, def: EntityDef) {
        self.defs.insert(name.into(), def);
    }

    /// Register one entity definition from its JSON blob. Malformed input,
    /// including unknown keys, is a fatal configuration error.
    pub fn register_json(&mut self, name: impl Into<String>, blob: &str) -> Result<()> {
        let name = name.into();
        let def: EntityDef = serde_json::from_str(blob).map_err(|err| {
            Error::configuration(format!("entity `{name}` has a malformed definition: {err}"))
        })?;
        self.defs.insert(name, def);
        Ok(())
    }

    pub fn def(&self, name: &str) -> Option<&EntityDef> {
        self.defs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Resolve an entity type for the given role set.
    ///
    /// The memo is keyed by the role set as a whole; asking with a different
    /// set than the previous call drops every cached type.
    pub fn resolve(&self, entity: &str, roles: &RoleSet) -> Result<Arc<EntityType>> {
        let mut memo = self.memo.borrow_mut();

        if memo.roles != *roles {
            tracing::debug!(?roles, "role set changed, invalidating resolved entity types");
            memo.types.clear();
            memo.roles = roles.clone();
        }

        if let Some(ty) = memo.types.get(entity) {
            return Ok(ty.clone());
        }

        let def = self
            .defs
            .get(entity)
            .ok_or_else(|| Error::configuration(format!("unknown entity type `{entity}`")))?;

        let ty = Arc::new(EntityType::resolve(entity, def, roles)?);
        memo.types.insert(entity.to_string(), ty.clone());
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .register_json(
                "user",
                r#"{
                    "connection": "main",
                    "table": "user",
                    "keys": ["userid"],
                    "fields": {
                        "userid": {"type": "integer", "auto": true},
                        "username": {"type": "text"},
                        "password": {"type": "text", "read_by": ["nobody"]},
                        "first_name": {"type": "text"},
                        "last_name": {"type": "text"}
                    }
                }"#,
            )
            .unwrap();
        schema
    }

    #[test]
    fn unreadable_fields_are_dropped() {
        let schema = user_schema();
        let user = schema.resolve("user", &RoleSet::anonymous()).unwrap();

        let names: Vec<_> = user.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["userid", "username", "first_name", "last_name"]);
        assert!(user.field("password").unwrap_err().is_permission());
    }

    #[test]
    fn memo_invalidates_on_role_change() {
        let schema = user_schema();

        let first = schema.resolve("user", &RoleSet::anonymous()).unwrap();
        let again = schema.resolve("user", &RoleSet::anonymous()).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let authed = schema
            .resolve("user", &RoleSet::authenticated(["admin"]))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &authed));
    }

    #[test]
    fn double_auto_key_is_fatal() {
        let mut schema = Schema::new();
        schema
            .register_json(
                "bad",
                r#"{
                    "connection": "main",
                    "table": "bad",
                    "keys": ["a", "b"],
                    "fields": {
                        "a": {"type": "integer", "auto": true},
                        "b": {"type": "integer", "auto": true}
                    }
                }"#,
            )
            .unwrap();
        let err = schema.resolve("bad", &RoleSet::anonymous()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn ambiguous_subtable_default_is_fatal() {
        let mut schema = Schema::new();
        schema
            .register_json(
                "pair",
                r#"{
                    "connection": "main",
                    "table": "pair",
                    "keys": ["a", "b"],
                    "fields": {
                        "a": {"type": "integer"},
                        "b": {"type": "integer"}
                    },
                    "subtables": {
                        "items": {"object": "item"}
                    }
                }"#,
            )
            .unwrap();
        let err = schema.resolve("pair", &RoleSet::anonymous()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn subtable_defaults_to_single_key() {
        let mut schema = Schema::new();
        schema
            .register_json(
                "project",
                r#"{
                    "connection": "main",
                    "table": "project",
                    "keys": ["id"],
                    "fields": {"id": {"type": "integer", "auto": true}},
                    "subtables": {"tasks": {"object": "task", "remote_field": "project"}}
                }"#,
            )
            .unwrap();
        let project = schema.resolve("project", &RoleSet::anonymous()).unwrap();
        let tasks = project.link("tasks").unwrap();
        assert_eq!(tasks.local_field, "id");
        assert_eq!(tasks.remote_field, "project");
    }
}
