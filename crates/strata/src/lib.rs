pub mod driver;
pub use driver::{Connection, ExecuteResponse};

mod db;
pub use db::{Db, Pool};

mod cache;
pub use cache::IdentityCache;

mod entity;
pub use entity::{Entity, LoadState};

mod collection;
pub use collection::Collection;

mod registry;
pub use registry::{PreparedQueries, PreparedQuery, QueryCode};

pub use strata_core::{schema, stmt, Error, Result};
pub use strata_sql::{CollectionOrder, Flavor, Projection, Serializer};
