use crate::driver::Connection;

use strata_core::{Error, Result};
use strata_sql::Flavor;

use indexmap::IndexMap;
use url::Url;

/// Logical connection name → live connection plus its dialect.
///
/// The flavor is derived from the DSN scheme at registration time; nothing
/// else ever inspects the DSN, and the core asks for the flavor only at
/// SQL-emission time.
#[derive(Debug, Default)]
pub struct Pool {
    entries: IndexMap<String, PoolEntry>,
}

#[derive(Debug)]
struct PoolEntry {
    dsn: Url,
    flavor: Flavor,
    connection: Box<dyn Connection>,
}

impl Pool {
    pub fn new() -> Pool {
        Pool::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        dsn: &str,
        connection: Box<dyn Connection>,
    ) -> Result<()> {
        let name = name.into();
        let dsn = Url::parse(dsn)
            .map_err(|err| Error::configuration(format!("invalid DSN for `{name}`: {err}")))?;
        let flavor = Flavor::from_scheme(dsn.scheme()).ok_or_else(|| {
            Error::configuration(format!(
                "connection `{}` has unsupported scheme `{}`",
                name,
                dsn.scheme()
            ))
        })?;

        tracing::debug!(connection = %name, flavor = ?flavor, "register connection");
        self.entries.insert(
            name,
            PoolEntry {
                dsn,
                flavor,
                connection,
            },
        );
        Ok(())
    }

    pub fn flavor(&self, name: &str) -> Result<Flavor> {
        Ok(self.entry(name)?.flavor)
    }

    pub fn dsn(&self, name: &str) -> Result<&Url> {
        Ok(&self.entry(name)?.dsn)
    }

    pub fn connection(&mut self, name: &str) -> Result<&mut dyn Connection> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::configuration(format!("unknown connection `{name}`")))?;
        Ok(&mut *entry.connection)
    }

    fn entry(&self, name: &str) -> Result<&PoolEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::configuration(format!("unknown connection `{name}`")))
    }
}
