use super::{Type, Value};
use crate::Result;

/// A fully compiled, parameterized statement.
///
/// `param_types` records the declared type of every bind position so values
/// can be coerced before execution rather than inferred by the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStmt {
    pub sql: String,

    /// Positional bind values, parallel to `param_types`
    pub params: Vec<Value>,

    /// Declared type of each bind position
    pub param_types: Vec<Type>,

    /// Logical names of the result columns, in projection order
    pub columns: Vec<String>,
}

impl CompiledStmt {
    /// Coerce every bind value to its declared type.
    pub fn coerce_params(mut self) -> Result<Self> {
        debug_assert_eq!(self.params.len(), self.param_types.len());

        self.params = self
            .params
            .into_iter()
            .zip(self.param_types.iter())
            .map(|(value, ty)| value.coerce(*ty))
            .collect::<Result<_>>()?;
        Ok(self)
    }
}
