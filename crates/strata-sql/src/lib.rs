#[macro_use]
pub mod serializer;
pub use serializer::{Flavor, Serializer};

mod entity;
pub use entity::{CollectionOrder, Projection};

mod join;
pub use join::{JoinKind, JoinNode, JoinQuery, Page};
