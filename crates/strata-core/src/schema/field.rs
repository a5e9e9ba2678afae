use super::{FieldDef, PermissionSet};
use crate::{
    stmt::{FieldRef, Type, Value},
    Error, Result,
};

use regex::Regex;

/// A resolved field definition.
#[derive(Debug, Clone)]
pub struct Field {
    /// Logical field name
    pub name: String,

    /// Physical SQL expression; `{}` stands for the table alias
    pub sql: String,

    /// Declared data type
    pub ty: Type,

    /// True when this is the auto-generated surrogate key
    pub auto: bool,

    /// Set when the field is a foreign-key link
    pub link: Option<LinkTarget>,

    /// Enumerated allowed values
    pub values: Option<Vec<String>>,

    /// Compiled validation pattern
    pub pattern: Option<Regex>,

    /// Insert default
    pub default: Option<Value>,

    pub permissions: PermissionSet,
}

/// Join-predicate shape of a foreign-key field. Both names default to the
/// owning field's own name.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    pub entity: String,
    pub local_field: String,
    pub remote_field: String,
    pub display: Option<String>,
}

impl Field {
    pub(super) fn resolve(name: &str, def: &FieldDef) -> Result<Field> {
        let sql = def
            .sql
            .clone()
            .unwrap_or_else(|| format!("{{}}.{name}"));

        let pattern = match &def.pattern {
            Some(src) => Some(Regex::new(src).map_err(|err| {
                Error::configuration(format!("field `{name}` has an invalid pattern: {err}"))
            })?),
            None => None,
        };

        let default = match &def.default {
            Some(json) => Some(json_to_value(name, json)?.coerce(def.ty).map_err(|_| {
                Error::configuration(format!(
                    "default for field `{name}` does not fit type {}",
                    def.ty
                ))
            })?),
            None => None,
        };

        let link = def.link.as_ref().map(|entity| LinkTarget {
            entity: entity.clone(),
            local_field: def.local_field.clone().unwrap_or_else(|| name.to_string()),
            remote_field: def.remote_field.clone().unwrap_or_else(|| name.to_string()),
            display: def.display.clone(),
        });

        Ok(Field {
            name: name.to_string(),
            sql,
            ty: def.ty,
            auto: def.auto,
            link,
            values: def.values.clone(),
            pattern,
            default,
            permissions: PermissionSet::new(
                def.read_by.clone(),
                def.write_by.clone(),
                def.insert_by.clone(),
                def.delete_by.clone(),
            ),
        })
    }

    /// A bound reference for filter/projection/order lists.
    pub fn reference(&self) -> FieldRef {
        FieldRef {
            name: self.name.clone(),
            sql: self.sql.clone(),
            ty: self.ty,
        }
    }

    /// The bare column name, when the expression is a plain column.
    pub fn plain_column(&self) -> Option<&str> {
        let rest = self.sql.strip_prefix("{}.")?;
        if rest.contains(|c: char| !c.is_alphanumeric() && c != '_') {
            return None;
        }
        Some(rest)
    }

    /// Check a value against the enumerated values or pattern, before any
    /// SQL is built.
    pub fn validate(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let rendered = value.render();

        if let Some(values) = &self.values {
            if !values.iter().any(|allowed| *allowed == rendered) {
                return Err(Error::validation_values(&self.name, rendered));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&rendered) {
                return Err(Error::validation_pattern(
                    &self.name,
                    rendered,
                    pattern.as_str(),
                ));
            }
        }
        Ok(())
    }
}

fn json_to_value(field: &str, json: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(v) => Value::Bool(*v),
        Json::Number(n) => match n.as_i64() {
            Some(v) => Value::I64(v),
            None => Value::F64(n.as_f64().unwrap_or_default()),
        },
        Json::String(v) => Value::String(v.clone()),
        Json::Array(_) | Json::Object(_) => {
            return Err(Error::configuration(format!(
                "default for field `{field}` must be a scalar"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_def(json: &str) -> FieldDef {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn validates_enumerated_values() {
        let field =
            Field::resolve("state", &field_def(r#"{"type": "text", "values": ["open", "done"]}"#))
                .unwrap();
        field.validate(&Value::from("open")).unwrap();
        assert!(field
            .validate(&Value::from("zombie"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn validates_pattern() {
        let field = Field::resolve(
            "email",
            &field_def(r#"{"type": "text", "pattern": "^[^@]+@[^@]+$"}"#),
        )
        .unwrap();
        field.validate(&Value::from("a@b.example")).unwrap();
        assert!(field
            .validate(&Value::from("not-an-email"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn bad_pattern_is_a_configuration_error() {
        let err =
            Field::resolve("x", &field_def(r#"{"type": "text", "pattern": "["}"#)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn link_names_default_to_field_name() {
        let field = Field::resolve("owner", &field_def(r#"{"type": "integer", "link": "user"}"#))
            .unwrap();
        let link = field.link.unwrap();
        assert_eq!(link.local_field, "owner");
        assert_eq!(link.remote_field, "owner");
    }

    #[test]
    fn plain_column_detection() {
        let plain = Field::resolve("name", &field_def(r#"{"type": "text"}"#)).unwrap();
        assert_eq!(plain.plain_column(), Some("name"));

        let computed = Field::resolve(
            "full_name",
            &field_def(r#"{"type": "text", "sql": "CONCAT({}.first, ' ', {}.last)"}"#),
        )
        .unwrap();
        assert_eq!(computed.plain_column(), None);
    }
}
