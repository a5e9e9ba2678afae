/// The SQL dialect a connection speaks.
///
/// Nothing in the core hard-codes a dialect; the flavor is asked for only at
/// SQL-emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Mysql,
    Oracle,
}

impl Flavor {
    /// Map a connection URL scheme to its flavor.
    pub fn from_scheme(scheme: &str) -> Option<Flavor> {
        match scheme {
            "mysql" => Some(Flavor::Mysql),
            "oracle" | "oci" => Some(Flavor::Oracle),
            _ => None,
        }
    }

    /// The literal random-order marker for `ORDER BY`.
    pub(crate) fn random_marker(self) -> &'static str {
        match self {
            Flavor::Mysql => "RAND()",
            Flavor::Oracle => "DBMS_RANDOM.VALUE",
        }
    }
}
