use crate::stmt::Type;

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Raw schema input for one entity type, as deserialized from its
/// definition blob. Unknown keys at any level are a hard parse error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    /// Logical connection name
    pub connection: String,

    /// Physical table name
    pub table: String,

    /// Ordered key field names; possibly composite
    pub keys: Vec<String>,

    #[serde(default)]
    pub fields: IndexMap<String, FieldDef>,

    #[serde(default)]
    pub subtables: IndexMap<String, SubtableDef>,

    #[serde(default)]
    pub read_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub write_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub insert_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub delete_by: Option<BTreeSet<String>>,
}

/// Raw definition of one field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub ty: Type,

    /// Physical SQL expression; `{}` stands for the table alias. Defaults
    /// to `{}.<name>`.
    #[serde(default)]
    pub sql: Option<String>,

    /// Auto-generated surrogate key
    #[serde(default)]
    pub auto: bool,

    /// Target entity type when this field is a foreign-key link
    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub local_field: Option<String>,
    #[serde(default)]
    pub remote_field: Option<String>,

    /// Display template used when collecting a linked entity to a scalar,
    /// e.g. `"{first_name} {last_name}"`
    #[serde(default)]
    pub display: Option<String>,

    /// Enumerated allowed values
    #[serde(default)]
    pub values: Option<Vec<String>>,

    /// Validation pattern (regular expression)
    #[serde(default)]
    pub pattern: Option<String>,

    /// Insert default, contributed when the field is not supplied
    #[serde(default)]
    pub default: Option<serde_json::Value>,

    #[serde(default)]
    pub read_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub write_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub insert_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub delete_by: Option<BTreeSet<String>>,
}

/// Raw definition of one subtable (one-to-many link).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubtableDef {
    /// Target entity type
    pub object: String,

    #[serde(default)]
    pub local_field: Option<String>,
    #[serde(default)]
    pub remote_field: Option<String>,

    #[serde(default)]
    pub read_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub write_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub insert_by: Option<BTreeSet<String>>,
    #[serde(default)]
    pub delete_by: Option<BTreeSet<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<EntityDef>(
            r#"{"connection": "main", "table": "t", "keys": ["id"], "bogus": 1}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bogus"));

        let err = serde_json::from_str::<FieldDef>(r#"{"type": "text", "writable": true}"#)
            .unwrap_err();
        assert!(err.to_string().contains("writable"));
    }
}
