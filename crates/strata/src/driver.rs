pub mod mem;

use strata_core::{
    stmt::{CompiledStmt, Value},
    Result,
};

use std::fmt::Debug;

/// A live connection to one backing database.
///
/// Synchronous by design: one request is handled start to finish on one
/// logical worker, and a statement blocks until the driver returns. Bind
/// values arrive already coerced to their declared types.
pub trait Connection: Debug {
    fn execute(&mut self, stmt: &CompiledStmt, params: Vec<Value>) -> Result<ExecuteResponse>;
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default)]
pub struct ExecuteResponse {
    /// Fetched rows, parallel to the statement's column list
    pub rows: Vec<Vec<Value>>,

    /// Rows impacted by a write
    pub affected: u64,

    /// Surrogate key produced by an INSERT, when the driver reports one
    pub generated_key: Option<Value>,
}

impl ExecuteResponse {
    pub fn rows(rows: Vec<Vec<Value>>) -> ExecuteResponse {
        ExecuteResponse {
            rows,
            ..Default::default()
        }
    }

    pub fn count(affected: u64) -> ExecuteResponse {
        ExecuteResponse {
            affected,
            ..Default::default()
        }
    }

    pub fn inserted(generated_key: impl Into<Value>) -> ExecuteResponse {
        ExecuteResponse {
            affected: 1,
            generated_key: Some(generated_key.into()),
            ..Default::default()
        }
    }
}
