use super::{Action, EntityDef, Field, Link, PermissionSet, RoleSet};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// An entity type definition resolved for one caller's role set.
///
/// The field and link maps contain only entries the caller may read;
/// unreadable entries are dropped entirely so they can never leak through
/// enumeration. Derived views exist for write/insert/delete.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,

    /// Logical connection name
    pub connection: String,

    /// Physical table name
    pub table: String,

    /// Ordered key field names
    pub keys: Vec<String>,

    /// Name of the auto-generated surrogate key, when the type has one
    pub auto_key: Option<String>,

    /// Readable fields, in definition order
    pub fields: IndexMap<String, Field>,

    /// Readable subtable links, in definition order
    pub links: IndexMap<String, Link>,

    /// Names of fields the caller may update
    pub writeable: BTreeSet<String>,

    /// Names of fields the caller may supply on insert
    pub insertable: BTreeSet<String>,

    /// Table-level: may the caller delete rows of this type
    pub deletable: bool,
}

impl EntityType {
    pub(super) fn resolve(name: &str, def: &EntityDef, roles: &RoleSet) -> Result<EntityType> {
        let table_perms = PermissionSet::new(
            def.read_by.clone(),
            def.write_by.clone(),
            def.insert_by.clone(),
            def.delete_by.clone(),
        );

        let mut auto_key = None;
        let mut fields = IndexMap::new();
        let mut writeable = BTreeSet::new();
        let mut insertable = BTreeSet::new();

        for (field_name, field_def) in &def.fields {
            let field = Field::resolve(field_name, field_def)?;

            if field.auto {
                if auto_key.is_some() {
                    return Err(Error::configuration(format!(
                        "entity `{name}` declares more than one auto-generated key"
                    )));
                }
                if !def.keys.contains(field_name) {
                    return Err(Error::configuration(format!(
                        "auto-generated field `{field_name}` of `{name}` is not a key field"
                    )));
                }
                auto_key = Some(field_name.clone());
            }

            if !field.permissions.allows(Action::Read, roles, &table_perms) {
                tracing::trace!(entity = name, field = %field_name, "dropping unreadable field");
                continue;
            }
            // The auto-generated surrogate key is owned by the database;
            // it is never writeable or insertable for any caller
            if !field.auto && field.permissions.allows(Action::Write, roles, &table_perms) {
                writeable.insert(field_name.clone());
            }
            if !field.auto && field.permissions.allows(Action::Insert, roles, &table_perms) {
                insertable.insert(field_name.clone());
            }
            fields.insert(field_name.clone(), field);
        }

        for key in &def.keys {
            if !def.fields.contains_key(key) {
                return Err(Error::configuration(format!(
                    "key field `{key}` of `{name}` is not defined"
                )));
            }
            if !fields.contains_key(key) {
                // An entity whose key the caller cannot read is unusable.
                return Err(Error::permission("read", name, Some(key)));
            }
        }

        let mut links = IndexMap::new();
        for (link_name, sub) in &def.subtables {
            let local_field = match &sub.local_field {
                Some(local) => local.clone(),
                None => {
                    if def.keys.len() != 1 {
                        return Err(Error::configuration(format!(
                            "subtable `{link_name}` of `{name}` cannot default its local field: \
                             the entity does not have exactly one key field"
                        )));
                    }
                    def.keys[0].clone()
                }
            };
            let remote_field = sub.remote_field.clone().unwrap_or_else(|| local_field.clone());

            let permissions = PermissionSet::new(
                sub.read_by.clone(),
                sub.write_by.clone(),
                sub.insert_by.clone(),
                sub.delete_by.clone(),
            );
            if !permissions.allows(Action::Read, roles, &table_perms) {
                tracing::trace!(entity = name, link = %link_name, "dropping unreadable subtable");
                continue;
            }

            links.insert(
                link_name.clone(),
                Link {
                    name: link_name.clone(),
                    entity: sub.object.clone(),
                    local_field,
                    remote_field,
                    permissions,
                },
            );
        }

        Ok(EntityType {
            name: name.to_string(),
            connection: def.connection.clone(),
            table: def.table.clone(),
            keys: def.keys.clone(),
            auto_key,
            fields,
            links,
            writeable,
            insertable,
            deletable: table_perms.allows_table(Action::Delete, roles),
        })
    }

    /// Look up a readable field; unknown and unreadable are indistinguishable
    /// by design.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::permission("read", &self.name, Some(name)))
    }

    pub fn link(&self, name: &str) -> Result<&Link> {
        self.links
            .get(name)
            .ok_or_else(|| Error::permission("read", &self.name, Some(name)))
    }

    /// The key fields, in key order.
    pub fn key_fields(&self) -> Vec<&Field> {
        // resolve() guarantees every key is present in `fields`
        self.keys
            .iter()
            .map(|key| &self.fields[key.as_str()])
            .collect()
    }

    /// The update permission boundary: a requested field outside the
    /// writeable set is a hard failure, not a silent drop.
    pub fn check_writeable(&self, name: &str) -> Result<&Field> {
        if !self.writeable.contains(name) {
            return Err(Error::permission("write", &self.name, Some(name)));
        }
        self.field(name)
    }

    /// The insert permission boundary.
    pub fn check_insertable(&self, name: &str) -> Result<&Field> {
        if !self.insertable.contains(name) {
            return Err(Error::permission("insert", &self.name, Some(name)));
        }
        self.field(name)
    }

    pub fn check_deletable(&self) -> Result<()> {
        if !self.deletable {
            return Err(Error::permission("delete", &self.name, None));
        }
        Ok(())
    }
}
