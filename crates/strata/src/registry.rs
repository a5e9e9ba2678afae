use strata_core::stmt::Type;

use std::collections::HashMap;

/// Opaque handle to a registered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryCode(u64);

/// A registered query, as handed back by `lookup`.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub connection: String,
    pub sql: String,
    pub param_types: Vec<Type>,
    pub result_types: Vec<Type>,
}

/// Request-scoped registry of compiled statements, keyed by opaque code so
/// an outer transport can reference a query without carrying its SQL.
///
/// Registering the same (connection, sql) pair twice returns the existing
/// code rather than a duplicate entry.
#[derive(Debug, Default)]
pub struct PreparedQueries {
    by_stmt: HashMap<(String, String), QueryCode>,
    entries: Vec<PreparedQuery>,
}

impl PreparedQueries {
    pub fn new() -> PreparedQueries {
        PreparedQueries::default()
    }

    pub fn register(
        &mut self,
        connection: impl Into<String>,
        sql: impl Into<String>,
        param_types: Vec<Type>,
        result_types: Vec<Type>,
    ) -> QueryCode {
        let connection = connection.into();
        let sql = sql.into();

        let key = (connection.clone(), sql.clone());
        if let Some(code) = self.by_stmt.get(&key) {
            return *code;
        }

        let code = QueryCode(self.entries.len() as u64);
        self.entries.push(PreparedQuery {
            connection,
            sql,
            param_types,
            result_types,
        });
        self.by_stmt.insert(key, code);
        code
    }

    pub fn lookup(&self, code: QueryCode) -> Option<&PreparedQuery> {
        self.entries.get(code.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_returns_existing_code() {
        let mut registry = PreparedQueries::new();

        let a = registry.register("main", "SELECT 1", vec![], vec![Type::Integer]);
        let b = registry.register("main", "SELECT 2", vec![], vec![Type::Integer]);
        let dup = registry.register("main", "SELECT 1", vec![], vec![Type::Integer]);

        assert_ne!(a, b);
        assert_eq!(a, dup);
        assert_eq!(registry.len(), 2);

        // Same SQL on another connection is a distinct entry
        let c = registry.register("aux", "SELECT 1", vec![], vec![Type::Integer]);
        assert_ne!(a, c);
        assert_eq!(registry.lookup(c).unwrap().connection, "aux");
    }
}
