use crate::{Collection, Db};

use strata_core::{
    schema::EntityType,
    stmt::{Value, WhereList, WherePart},
    Error, Result,
};

use indexmap::IndexMap;

use std::{cell::RefCell, rc::Rc, sync::Arc};

/// Load state of an entity instance.
///
/// A fresh handle starts `NotLoaded` and upgrades in place on first access;
/// there is no separate proxy type. `NoRecord` is a normal state, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    NoRecord,
    Loaded,
}

/// Handle to one row-equivalent instance.
///
/// Cloning is cheap and aliases the same state; the identity cache
/// guarantees at most one state per (entity type, key) identity.
/// Single-threaded on purpose: one request, one worker, one cache.
#[derive(Debug, Clone)]
pub struct Entity {
    state: Rc<RefCell<EntityState>>,
}

#[derive(Debug)]
struct EntityState {
    ty: Arc<EntityType>,
    keys: Vec<Value>,
    load: LoadState,

    /// Field values as last read from the database
    snapshot: IndexMap<String, Value>,

    /// Fields explicitly set since the last load/save; the only path
    /// through which mutation reaches SQL
    pending: IndexMap<String, Value>,

    /// Non-owning back-reference to the instance that produced this one via
    /// a link traversal; nulled by `clean()`
    parent: Option<Entity>,

    /// Materialized link children, kept for reuse and for the cleanup
    /// traversal
    links: IndexMap<String, Entity>,
    collections: IndexMap<String, Collection>,
}

impl Entity {
    pub(crate) fn new(ty: Arc<EntityType>, keys: Vec<Value>, parent: Option<Entity>) -> Entity {
        Entity {
            state: Rc::new(RefCell::new(EntityState {
                ty,
                keys,
                load: LoadState::NotLoaded,
                snapshot: IndexMap::new(),
                pending: IndexMap::new(),
                parent,
                links: IndexMap::new(),
                collections: IndexMap::new(),
            })),
        }
    }

    pub fn entity_name(&self) -> String {
        self.state.borrow().ty.name.clone()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.state.borrow().keys.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load
    }

    pub fn parent(&self) -> Option<Entity> {
        self.state.borrow().parent.clone()
    }

    pub fn is_same(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn adopt_parent(&self, parent: Entity) {
        let mut state = self.state.borrow_mut();
        if state.parent.is_none() {
            state.parent = Some(parent);
        }
    }

    /// Pre-populate the snapshot from an already-fetched row, skipping the
    /// lazy load on first access.
    pub(crate) fn seed(&self, columns: &[String], row: Vec<Value>) {
        let mut state = self.state.borrow_mut();
        state.snapshot = columns.iter().cloned().zip(row).collect();
        state.load = LoadState::Loaded;
    }

    /// Read one field, lazily loading the row on first access.
    ///
    /// Pending changes shadow the snapshot. A field missing from the
    /// snapshot but part of the key answers from the key tuple, so key
    /// access never needs a query. Unknown or unreadable fields fail.
    pub fn get(&self, db: &Db, field: &str) -> Result<Value> {
        {
            let state = self.state.borrow();
            state.ty.field(field)?;
            if let Some(value) = state.pending.get(field) {
                return Ok(value.clone());
            }
            if let Some(position) = state.ty.keys.iter().position(|key| key == field) {
                return Ok(state.keys[position].clone());
            }
        }

        self.ensure_loaded(db)?;

        let state = self.state.borrow();
        Ok(state.snapshot.get(field).cloned().unwrap_or(Value::Null))
    }

    /// Stage one field change. Validation and the writeable/insertable
    /// check happen here, before anything reaches SQL; nothing is written
    /// until `save`.
    pub fn set(&self, field: &str, value: Value) -> Result<()> {
        {
            let state = self.state.borrow();
            let field = if state.inserting() {
                state.ty.check_insertable(field)?
            } else {
                state.ty.check_writeable(field)?
            };
            field.validate(&value)?;
        }

        self.state.borrow_mut().pending.insert(field.to_string(), value);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    /// Flush pending changes: INSERT when no row exists yet, UPDATE
    /// otherwise. Returns `Ok(false)` when there is nothing to save.
    ///
    /// After a save the instance re-registers in the identity cache under
    /// its (possibly new) key and resets to `NotLoaded`, so the next access
    /// re-reads authoritative state.
    pub fn save(&self, db: &Db) -> Result<bool> {
        if !self.has_pending() {
            return Ok(false);
        }

        let (ty, old_keys) = {
            let state = self.state.borrow();
            (state.ty.clone(), state.keys.clone())
        };

        let inserting = if old_keys.iter().all(Value::is_empty_key) {
            true
        } else {
            self.ensure_loaded(db)?;
            self.state.borrow().load == LoadState::NoRecord
        };

        let pending = self.state.borrow().pending.clone();
        let serializer = db.serializer(&ty.connection)?;

        let new_keys = if inserting {
            let stmt = serializer.insert(&ty, &pending)?;
            let response = db.execute(&ty.connection, &stmt)?;

            let mut keys = Vec::with_capacity(ty.keys.len());
            for (i, name) in ty.keys.iter().enumerate() {
                if ty.auto_key.as_deref() == Some(name.as_str()) {
                    if let Some(generated) = &response.generated_key {
                        keys.push(generated.clone());
                        continue;
                    }
                }
                match pending.get(name) {
                    Some(value) => keys.push(value.clone()),
                    None => keys.push(old_keys[i].clone()),
                }
            }
            keys
        } else {
            let stmt = serializer.update(&ty, &old_keys, &pending)?;
            db.execute(&ty.connection, &stmt)?;

            ty.keys
                .iter()
                .enumerate()
                .map(|(i, name)| match pending.get(name) {
                    Some(value) => value.clone(),
                    None => old_keys[i].clone(),
                })
                .collect()
        };

        db.cache_remove(&ty.name, &old_keys);
        {
            let mut state = self.state.borrow_mut();
            state.keys = new_keys;
            state.pending.clear();
            state.snapshot.clear();
            state.load = LoadState::NotLoaded;
        }
        db.cache_set(self.clone());

        Ok(true)
    }

    /// Delete the row and purge this identity from the cache.
    pub fn remove(&self, db: &Db) -> Result<()> {
        let (ty, keys) = {
            let state = self.state.borrow();
            (state.ty.clone(), state.keys.clone())
        };

        let stmt = db.serializer(&ty.connection)?.delete(&ty, &keys)?;
        db.execute(&ty.connection, &stmt)?;
        db.cache_remove(&ty.name, &keys);

        let mut state = self.state.borrow_mut();
        state.snapshot.clear();
        state.pending.clear();
        state.load = LoadState::NoRecord;
        Ok(())
    }

    /// Materialize the entity a foreign-key field points to, with this
    /// instance as its parent back-reference.
    pub fn link(&self, db: &Db, field: &str) -> Result<Entity> {
        if let Some(existing) = self.state.borrow().links.get(field) {
            return Ok(existing.clone());
        }

        let target = {
            let state = self.state.borrow();
            let field = state.ty.field(field)?;
            field
                .link
                .clone()
                .ok_or_else(|| Error::not_a_join_field(&state.ty.name, &field.name))?
        };

        let local_value = self.get(db, &target.local_field)?;

        let child_ty = db.resolve(&target.entity)?;
        if child_ty.keys.len() != 1 || child_ty.keys[0] != target.remote_field {
            return Err(Error::query_shape(format!(
                "link `{}` resolves by `{}`, which is not the key of `{}`",
                field, target.remote_field, target.entity
            )));
        }

        let child = db.get_with_parent(&target.entity, &[local_value], Some(self.clone()))?;
        self.state
            .borrow_mut()
            .links
            .insert(field.to_string(), child.clone());
        Ok(child)
    }

    /// Materialize a subtable as a lazy collection filtered by this
    /// instance's key side of the link.
    pub fn collection(&self, db: &Db, name: &str) -> Result<Collection> {
        if let Some(existing) = self.state.borrow().collections.get(name) {
            return Ok(existing.clone());
        }

        let link = {
            let state = self.state.borrow();
            state.ty.link(name)?.clone()
        };

        let parent_value = self.get(db, &link.local_field)?;
        let child_ty = db.resolve(&link.entity)?;

        let mut filter = WhereList::new();
        filter.and(WherePart::eq(
            child_ty.field(&link.remote_field)?.reference(),
            parent_value,
        ))?;

        let collection = Collection::new(child_ty, filter, Some(self.clone()));
        self.state
            .borrow_mut()
            .collections
            .insert(name.to_string(), collection.clone());
        Ok(collection)
    }

    /// Flatten the named fields into a plain value tree.
    ///
    /// Scalars collect as-is. A foreign-key field collects as its target
    /// rendered through the link's display template (or the remote key when
    /// none is declared). A subtable collects as a list of records, one per
    /// child row.
    pub fn collect(&self, db: &Db, fields: &[&str]) -> Result<Value> {
        let ty = self.state.borrow().ty.clone();

        let mut record = IndexMap::new();
        for &name in fields {
            let value = match ty.field(name) {
                Ok(field) => match field.link.clone() {
                    Some(target) => {
                        let child = self.link(db, name)?;
                        match &target.display {
                            Some(template) => {
                                Value::String(render_display(&child, db, template)?)
                            }
                            None => child.get(db, &target.remote_field)?,
                        }
                    }
                    None => self.get(db, name)?,
                },
                Err(err) => {
                    if ty.link(name).is_err() {
                        return Err(err);
                    }
                    let collection = self.collection(db, name)?;
                    let child_ty = db.resolve(&collection.entity_name())?;
                    let scalar_fields: Vec<&str> = child_ty
                        .fields
                        .values()
                        .filter(|field| field.link.is_none())
                        .map(|field| field.name.as_str())
                        .collect();

                    let mut rows = Vec::new();
                    for child in collection.entities(db)? {
                        rows.push(child.collect(db, &scalar_fields)?);
                    }
                    Value::List(rows)
                }
            };
            record.insert(name.to_string(), value);
        }
        Ok(Value::Record(record))
    }

    /// Explicit graph teardown: null the parent back-reference and walk
    /// into children whose parent is this instance. The identity check
    /// keeps shared ancestors from being cleaned twice.
    pub fn clean(&self) {
        let (links, collections) = {
            let mut state = self.state.borrow_mut();
            state.parent = None;
            (
                std::mem::take(&mut state.links),
                std::mem::take(&mut state.collections),
            )
        };

        for (_, child) in links {
            let owned = child
                .parent()
                .map_or(false, |parent| parent.is_same(self));
            if owned {
                child.clean();
            }
        }
        for (_, collection) in collections {
            collection.clean(self);
        }
    }

    fn ensure_loaded(&self, db: &Db) -> Result<()> {
        let (ty, keys) = {
            let state = self.state.borrow();
            if state.load != LoadState::NotLoaded {
                return Ok(());
            }
            (state.ty.clone(), state.keys.clone())
        };

        // An all-empty key identifies the insert template; there is no row
        // to fetch
        if keys.iter().all(Value::is_empty_key) {
            self.state.borrow_mut().load = LoadState::NoRecord;
            return Ok(());
        }

        let stmt = db.serializer(&ty.connection)?.select_one(&ty, &keys)?;
        let response = db.execute(&ty.connection, &stmt)?;

        let mut state = self.state.borrow_mut();
        match response.rows.into_iter().next() {
            Some(row) => {
                state.snapshot = stmt.columns.iter().cloned().zip(row).collect();
                state.load = LoadState::Loaded;
            }
            None => {
                state.load = LoadState::NoRecord;
            }
        }
        Ok(())
    }
}

impl EntityState {
    /// Whether a `set` runs under the insertable or the writeable check:
    /// an instance with no persisted identity stages an insert.
    fn inserting(&self) -> bool {
        self.keys.iter().all(Value::is_empty_key) || self.load == LoadState::NoRecord
    }
}

/// Fill a `{field}` display template from an entity's fields.
fn render_display(entity: &Entity, db: &Db, template: &str) -> Result<String> {
    let mut out = String::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(offset) => {
                let name = &rest[start + 1..start + offset];
                out.push_str(&entity.get(db, name)?.render());
                rest = &rest[start + offset + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                return Ok(out);
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}
