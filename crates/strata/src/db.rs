mod pool;
pub use pool::Pool;

use crate::{
    cache::IdentityCache,
    driver::ExecuteResponse,
    registry::{PreparedQueries, QueryCode},
    Entity,
};

use strata_core::{
    schema::{EntityType, RoleSet, Schema},
    stmt::{CompiledStmt, Type, Value},
    Error, Result,
};
use strata_sql::Serializer;

use std::{cell::RefCell, sync::Arc};

/// Request-scoped data-access context.
///
/// Owns the schema, the caller's role set, the connection pool, the
/// identity cache and the prepared-query registry. Constructed fresh at
/// the start of a request and torn down at the end; nothing here is
/// shared across concurrent requests.
#[derive(Debug)]
pub struct Db {
    schema: Schema,
    roles: RoleSet,
    pool: RefCell<Pool>,
    cache: RefCell<IdentityCache>,
    registry: RefCell<PreparedQueries>,
    /// When set, execution errors carry the full driver message
    debug: bool,
}

impl Db {
    pub fn new(schema: Schema, pool: Pool) -> Db {
        Db {
            schema,
            roles: RoleSet::anonymous(),
            pool: RefCell::new(pool),
            cache: RefCell::new(IdentityCache::new()),
            registry: RefCell::new(PreparedQueries::new()),
            debug: false,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Swap the caller's role set; the schema memo invalidates itself when
    /// the set differs from the one it was built for.
    pub fn set_roles(&mut self, roles: RoleSet) {
        self.roles = roles;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Resolve an entity type under the current role set.
    pub fn resolve(&self, entity: &str) -> Result<Arc<EntityType>> {
        self.schema.resolve(entity, &self.roles)
    }

    /// The SQL serializer for a logical connection's dialect.
    pub fn serializer(&self, connection: &str) -> Result<Serializer> {
        Ok(Serializer::new(self.pool.borrow().flavor(connection)?))
    }

    /// The single live handle for an identity: a cache hit, or a fresh
    /// not-loaded handle registered under that identity.
    pub fn get(&self, entity: &str, keys: &[Value]) -> Result<Entity> {
        self.get_with_parent(entity, keys, None)
    }

    /// The per-type empty prototype, used as an insert template.
    pub fn empty(&self, entity: &str) -> Result<Entity> {
        let ty = self.resolve(entity)?;
        let keys = vec![Value::Null; ty.keys.len()];
        self.get_with_parent(entity, &keys, None)
    }

    pub(crate) fn get_with_parent(
        &self,
        entity: &str,
        keys: &[Value],
        parent: Option<Entity>,
    ) -> Result<Entity> {
        let ty = self.resolve(entity)?;
        if keys.len() != ty.keys.len() {
            return Err(Error::query_shape(format!(
                "entity `{}` has {} key field(s), {} value(s) supplied",
                ty.name,
                ty.keys.len(),
                keys.len()
            )));
        }

        if let Some(hit) = self.cache.borrow().get(&ty.name, keys) {
            // A back-reference supplied at proxy-creation time survives the
            // cache round trip
            if let Some(parent) = parent {
                hit.adopt_parent(parent);
            }
            return Ok(hit);
        }

        let handle = Entity::new(ty, keys.to_vec(), parent);
        self.cache.borrow_mut().set(handle.clone());
        Ok(handle)
    }

    pub(crate) fn cache_set(&self, entity: Entity) {
        self.cache.borrow_mut().set(entity);
    }

    pub(crate) fn cache_remove(&self, entity: &str, keys: &[Value]) {
        self.cache.borrow_mut().remove(entity, keys);
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Coerce bind values positionally and run the statement on its
    /// connection. Driver failures are sanitized unless the debug flag is
    /// set, since driver messages may leak connection details.
    pub fn execute(&self, connection: &str, stmt: &CompiledStmt) -> Result<ExecuteResponse> {
        let coerced = stmt.clone().coerce_params()?;
        tracing::trace!(connection, sql = %coerced.sql, "execute");

        let mut pool = self.pool.borrow_mut();
        let result = pool.connection(connection)?.execute(stmt, coerced.params);

        result.map_err(|err| {
            tracing::error!(connection, error = %err, "statement execution failed");
            if self.debug {
                err
            } else {
                Error::execution("statement execution failed", None)
            }
        })
    }

    /// Register a compiled statement for later lookup by opaque code.
    pub fn prepare(
        &self,
        connection: &str,
        stmt: &CompiledStmt,
        result_types: Vec<Type>,
    ) -> QueryCode {
        self.registry.borrow_mut().register(
            connection,
            stmt.sql.clone(),
            stmt.param_types.clone(),
            result_types,
        )
    }

    pub fn registry(&self) -> std::cell::Ref<'_, PreparedQueries> {
        self.registry.borrow()
    }

    /// Explicit end-of-request teardown: break entity graphs and drop all
    /// request-scoped state.
    pub fn teardown(&self) {
        self.cache.borrow_mut().clear();
    }
}
