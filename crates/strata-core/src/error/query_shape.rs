use super::{Error, ErrorKind};

/// Error when a filter, order, or join tree is constructed in an invalid
/// shape. Raised at construction time, never at execute time.
#[derive(Debug)]
pub(super) struct QueryShapeError {
    pub(super) kind: QueryShapeErrorKind,
}

#[derive(Debug)]
pub(super) enum QueryShapeErrorKind {
    /// A where-list append broke the comparison/operator alternation
    Parity { list_len: usize, appended: usize },

    /// The item at an alternation position has the wrong kind
    Alternation { index: usize, expected: &'static str },

    /// An operator outside the comparison whitelist
    InvalidOperator { operator: String },

    /// A join alias was used twice within one query
    DuplicateAlias { alias: String },

    /// A join was requested through a field that is not a link
    NotAJoinField { entity: String, field: String },

    /// A node was attached to a query that already has a root
    RootAlreadyAttached,

    /// Free-form shape error
    Other { message: String },
}

impl Error {
    pub fn parity(list_len: usize, appended: usize) -> Error {
        Error::from(QueryShapeErrorKind::Parity { list_len, appended })
    }

    pub fn alternation(index: usize, expected: &'static str) -> Error {
        Error::from(QueryShapeErrorKind::Alternation { index, expected })
    }

    pub fn invalid_operator(operator: impl Into<String>) -> Error {
        Error::from(QueryShapeErrorKind::InvalidOperator {
            operator: operator.into(),
        })
    }

    pub fn duplicate_alias(alias: impl Into<String>) -> Error {
        Error::from(QueryShapeErrorKind::DuplicateAlias {
            alias: alias.into(),
        })
    }

    pub fn not_a_join_field(entity: impl Into<String>, field: impl Into<String>) -> Error {
        Error::from(QueryShapeErrorKind::NotAJoinField {
            entity: entity.into(),
            field: field.into(),
        })
    }

    pub fn root_already_attached() -> Error {
        Error::from(QueryShapeErrorKind::RootAlreadyAttached)
    }

    pub fn query_shape(message: impl Into<String>) -> Error {
        Error::from(QueryShapeErrorKind::Other {
            message: message.into(),
        })
    }
}

impl From<QueryShapeErrorKind> for Error {
    fn from(kind: QueryShapeErrorKind) -> Error {
        Error::from(ErrorKind::QueryShape(QueryShapeError { kind }))
    }
}

impl core::fmt::Display for QueryShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use QueryShapeErrorKind::*;

        match &self.kind {
            Parity { list_len, appended } => write!(
                f,
                "where-list parity violation: cannot append {} item(s) to a list of {} \
                 (comparisons must alternate with logical operators)",
                appended, list_len
            ),
            Alternation { index, expected } => write!(
                f,
                "where-list item {} is invalid: expected {}",
                index, expected
            ),
            InvalidOperator { operator } => {
                write!(f, "`{}` is not a valid comparison operator", operator)
            }
            DuplicateAlias { alias } => {
                write!(f, "join alias `{}` is already used in this query", alias)
            }
            NotAJoinField { entity, field } => write!(
                f,
                "field `{}` of `{}` is not a link and cannot be joined through",
                field, entity
            ),
            RootAlreadyAttached => f.write_str("query already has a root node"),
            Other { message } => f.write_str(message),
        }
    }
}
