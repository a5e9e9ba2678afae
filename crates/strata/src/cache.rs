use crate::Entity;

use strata_core::stmt::Value;

use std::collections::HashMap;

/// Separator joining composite key parts into one cache token. The unit
/// separator is not legal inside key values.
pub(crate) const KEY_SEPARATOR: char = '\u{1f}';

/// Token emitted for a null key part. Null renders to the empty string,
/// which would collide with an actual empty-string part.
pub(crate) const NULL_MARKER: char = '\u{0}';

/// Normalize an ordered key tuple into a single comparable token.
pub(crate) fn key_token(keys: &[Value]) -> String {
    let mut token = String::new();
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            token.push(KEY_SEPARATOR);
        }
        match key {
            Value::Null => token.push(NULL_MARKER),
            key => token.push_str(&key.render()),
        }
    }
    token
}

/// Request-scoped map from (entity type, key token) to the single live
/// representation of that row.
///
/// At most one handle exists per identity; `set` with an existing identity
/// replaces. Entities whose whole key is empty are never cached by key,
/// only as the per-type empty prototype used as an insert template.
#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: HashMap<(String, String), Entity>,
    prototypes: HashMap<String, Entity>,
}

impl IdentityCache {
    pub fn new() -> IdentityCache {
        IdentityCache::default()
    }

    pub fn get(&self, entity: &str, keys: &[Value]) -> Option<Entity> {
        if keys.iter().all(Value::is_empty_key) {
            return self.prototypes.get(entity).cloned();
        }
        self.entries
            .get(&(entity.to_string(), key_token(keys)))
            .cloned()
    }

    /// Register a handle under its current identity, replacing any previous
    /// representation.
    pub fn set(&mut self, entity: Entity) {
        let name = entity.entity_name();
        let keys = entity.keys();
        if keys.iter().all(Value::is_empty_key) {
            tracing::trace!(entity = %name, "cache empty prototype");
            self.prototypes.insert(name, entity);
            return;
        }
        let token = key_token(&keys);
        tracing::trace!(entity = %name, key = %token, "cache set");
        self.entries.insert((name, token), entity);
    }

    pub fn remove(&mut self, entity: &str, keys: &[Value]) -> Option<Entity> {
        if keys.iter().all(Value::is_empty_key) {
            return self.prototypes.remove(entity);
        }
        self.entries
            .remove(&(entity.to_string(), key_token(keys)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tear the whole cache down, running the explicit graph cleanup on
    /// every live handle so parent back-references cannot keep entity
    /// graphs alive past the request.
    pub fn clear(&mut self) {
        for entity in self.entries.values().chain(self.prototypes.values()) {
            entity.clean();
        }
        self.entries.clear();
        self.prototypes.clear();
    }
}
