#[macro_use]
mod fmt;
pub(crate) use fmt::ToSql;

mod delim;
pub(crate) use delim::Comma;

mod expr;
pub(crate) use expr::SelectItem;

mod flavor;
pub use flavor::Flavor;

mod params;
pub use params::{Params, Placeholder, TypedParams};

/// Serializes filter/projection/order structures to flavor-correct SQL.
///
/// The flavor handles the differences between SQL dialects: placeholder
/// syntax, row limiting, and the random-order marker.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    flavor: Flavor,
}

pub(crate) struct Formatter<'a, P> {
    /// Handle to the serializer
    pub(crate) serializer: &'a Serializer,

    /// Where to write the serialized SQL
    pub(crate) dst: &'a mut String,

    /// Where to store parameters
    pub(crate) params: &'a mut P,

    /// Current table alias, spliced into field expression templates
    pub(crate) alias: String,
}

impl Serializer {
    pub fn new(flavor: Flavor) -> Serializer {
        Serializer { flavor }
    }

    pub fn mysql() -> Serializer {
        Serializer::new(Flavor::Mysql)
    }

    pub fn oracle() -> Serializer {
        Serializer::new(Flavor::Oracle)
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub(crate) fn is_mysql(&self) -> bool {
        matches!(self.flavor, Flavor::Mysql)
    }

    pub(crate) fn is_oracle(&self) -> bool {
        matches!(self.flavor, Flavor::Oracle)
    }
}
