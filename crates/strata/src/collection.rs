use crate::{Db, Entity};

use strata_core::{
    schema::EntityType,
    stmt::{Value, WhereList},
    Error, Result,
};
use strata_sql::{CollectionOrder, Projection};

use std::{cell::RefCell, rc::Rc, sync::Arc};

/// Lazy handle to the child rows of one subtable link.
///
/// Nothing runs until first access; the upgrade query merges the implicit
/// parent foreign-key filter with any caller-supplied filter and populates
/// the collection with key-only handles. Row handles load individually on
/// access; eager mode seeds them from the collection query instead.
#[derive(Debug, Clone)]
pub struct Collection {
    state: Rc<RefCell<CollectionState>>,
}

#[derive(Debug)]
struct CollectionState {
    ty: Arc<EntityType>,

    /// Implicit parent-side filter, fixed at creation
    base_filter: WhereList,

    /// Caller-supplied filter, merged in as a nested group
    extra_filter: Option<WhereList>,

    order: CollectionOrder,
    eager: bool,
    parent: Option<Entity>,

    /// `Some` once upgraded
    rows: Option<Vec<Entity>>,
}

impl Collection {
    pub(crate) fn new(
        ty: Arc<EntityType>,
        base_filter: WhereList,
        parent: Option<Entity>,
    ) -> Collection {
        Collection {
            state: Rc::new(RefCell::new(CollectionState {
                ty,
                base_filter,
                extra_filter: None,
                order: CollectionOrder::Keys,
                eager: false,
                parent,
                rows: None,
            })),
        }
    }

    pub fn entity_name(&self) -> String {
        self.state.borrow().ty.name.clone()
    }

    /// Narrow the collection. Resets any previous upgrade so the next
    /// access re-runs the query.
    pub fn set_filter(&self, filter: WhereList) {
        let mut state = self.state.borrow_mut();
        state.extra_filter = Some(filter);
        state.rows = None;
    }

    pub fn set_order(&self, order: CollectionOrder) {
        let mut state = self.state.borrow_mut();
        state.order = order;
        state.rows = None;
    }

    /// Seed row handles with full rows during the upgrade query instead of
    /// key-only handles.
    pub fn set_eager(&self, eager: bool) {
        let mut state = self.state.borrow_mut();
        state.eager = eager;
        state.rows = None;
    }

    pub fn is_upgraded(&self) -> bool {
        self.state.borrow().rows.is_some()
    }

    /// Number of matching rows, via `COUNT(*)` — never upgrades.
    pub fn count(&self, db: &Db) -> Result<i64> {
        let (ty, filter) = {
            let state = self.state.borrow();
            (state.ty.clone(), state.merged_filter()?)
        };

        let stmt = db.serializer(&ty.connection)?.collection(
            &ty,
            Projection::Count,
            Some(&filter),
            &CollectionOrder::Keys,
        )?;
        let response = db.execute(&ty.connection, &stmt)?;

        match response.rows.into_iter().next().and_then(|row| row.into_iter().next()) {
            Some(value) => value.to_i64(),
            None => Ok(0),
        }
    }

    /// All row handles, upgrading on first call.
    pub fn entities(&self, db: &Db) -> Result<Vec<Entity>> {
        self.upgrade(db)?;
        Ok(self.state.borrow().rows.clone().unwrap_or_default())
    }

    pub fn len(&self, db: &Db) -> Result<usize> {
        self.upgrade(db)?;
        Ok(self
            .state
            .borrow()
            .rows
            .as_ref()
            .map(Vec::len)
            .unwrap_or(0))
    }

    pub fn is_empty(&self, db: &Db) -> Result<bool> {
        Ok(self.len(db)? == 0)
    }

    fn upgrade(&self, db: &Db) -> Result<()> {
        let (ty, filter, order, eager, parent) = {
            let state = self.state.borrow();
            if state.rows.is_some() {
                return Ok(());
            }
            (
                state.ty.clone(),
                state.merged_filter()?,
                state.order.clone(),
                state.eager,
                state.parent.clone(),
            )
        };

        let projection = if eager {
            Projection::Full
        } else {
            Projection::KeyOnly
        };
        let stmt =
            db.serializer(&ty.connection)?
                .collection(&ty, projection, Some(&filter), &order)?;
        let response = db.execute(&ty.connection, &stmt)?;

        let mut rows = Vec::with_capacity(response.rows.len());
        for row in response.rows {
            let keys = key_tuple(&ty, &stmt.columns, &row)?;
            let entity = db.get_with_parent(&ty.name, &keys, parent.clone())?;
            if eager {
                entity.seed(&stmt.columns, row);
            }
            rows.push(entity);
        }

        tracing::debug!(entity = %ty.name, rows = rows.len(), eager, "collection upgraded");
        self.state.borrow_mut().rows = Some(rows);
        Ok(())
    }

    /// Part of the explicit graph teardown: only cleans through rows when
    /// the collection actually belongs to the cleaning parent.
    pub(crate) fn clean(&self, parent: &Entity) {
        let rows = {
            let mut state = self.state.borrow_mut();
            let owned = state
                .parent
                .as_ref()
                .map_or(false, |own| own.is_same(parent));
            if !owned {
                return;
            }
            state.parent = None;
            state.rows.take()
        };

        for row in rows.into_iter().flatten() {
            let owned = row.parent().map_or(false, |own| own.is_same(parent));
            if owned {
                row.clean();
            }
        }
    }
}

impl CollectionState {
    fn merged_filter(&self) -> Result<WhereList> {
        let mut filter = self.base_filter.clone();
        if let Some(extra) = &self.extra_filter {
            filter.and_nested(extra.clone())?;
        }
        Ok(filter)
    }
}

/// Pull the ordered key tuple out of one result row.
fn key_tuple(ty: &EntityType, columns: &[String], row: &[Value]) -> Result<Vec<Value>> {
    ty.keys
        .iter()
        .map(|key| {
            columns
                .iter()
                .position(|column| column == key)
                .and_then(|i| row.get(i).cloned())
                .ok_or_else(|| {
                    Error::execution(
                        format!("result row is missing key column `{key}`"),
                        None,
                    )
                })
        })
        .collect()
}
