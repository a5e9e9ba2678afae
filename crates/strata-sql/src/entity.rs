use crate::serializer::{Comma, Formatter, Params, SelectItem, Serializer, ToSql, TypedParams};

use strata_core::{
    schema::EntityType,
    stmt::{CompiledStmt, Direction, Printable, Value, WhereList, WherePart},
    Error, Result,
};

use indexmap::IndexMap;

/// Projection mode for a collection statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// All readable fields
    Full,
    /// Key fields only
    KeyOnly,
    /// A single `COUNT(*)`
    Count,
}

/// Ordering of a collection statement.
#[derive(Debug, Clone, Default)]
pub enum CollectionOrder {
    /// Order by the key fields
    #[default]
    Keys,
    /// Explicit field-name ordering
    Explicit(Vec<(String, Direction)>),
    /// The flavor's literal random-order marker
    Random,
}

impl Serializer {
    /// Compile a SELECT of exactly one row, filtered by the full key tuple.
    pub fn select_one(&self, entity: &EntityType, keys: &[Value]) -> Result<CompiledStmt> {
        let filter = key_filter(entity, keys)?;

        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = self.formatter(&mut sql, &mut params, &entity.table);

        let items = entity.fields.values().map(|field| Printable::Field(field.reference()));
        let items: Vec<_> = items.collect();
        let select = items.iter().zip(entity.fields.values()).map(|(expr, field)| SelectItem {
            expr,
            alias: if field.reference().is_trivial() {
                None
            } else {
                Some(field.name.as_str())
            },
        });

        fmt!(&mut f, "SELECT " Comma(select) " FROM " entity.table " WHERE " filter);

        // Exactly-one-row limiting is dialect specific
        if self.is_oracle() {
            fmt!(&mut f, " AND (ROWNUM = 1)");
        } else {
            fmt!(&mut f, " LIMIT 1");
        }

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns: entity.fields.keys().cloned().collect(),
        })
    }

    /// Compile an INSERT from the caller-supplied changed fields.
    ///
    /// This is the permission enforcement boundary for insertion: a field
    /// outside the insertable set is a hard failure. Insertable fields that
    /// were not supplied but declare a default contribute that default.
    pub fn insert(
        &self,
        entity: &EntityType,
        changes: &IndexMap<String, Value>,
    ) -> Result<CompiledStmt> {
        let mut columns = Vec::new();
        let mut supplied = Vec::new();

        for (name, value) in changes {
            let field = entity.check_insertable(name)?;
            field.validate(value)?;
            columns.push(physical_column(entity, name)?);
            supplied.push((field, value.clone()));
        }

        // Unsupplied insertable fields with a declared default
        for name in &entity.insertable {
            if changes.contains_key(name) {
                continue;
            }
            let field = &entity.fields[name.as_str()];
            if let Some(default) = &field.default {
                columns.push(physical_column(entity, name)?);
                supplied.push((field, default.clone()));
            }
        }

        if supplied.is_empty() {
            return Err(Error::query_shape("insert requires at least one field"));
        }

        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = self.formatter(&mut sql, &mut params, &entity.table);

        let values = supplied
            .iter()
            .map(|(field, value)| f.params.push(value, field.ty))
            .collect::<Vec<_>>();

        fmt!(&mut f, "INSERT INTO " entity.table " (" Comma(columns.iter().copied()) ") VALUES (" Comma(values) ")");

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns: vec![],
        })
    }

    /// Compile an UPDATE of the caller-supplied changed fields, filtered by
    /// the full key tuple.
    ///
    /// The write permission boundary: a field outside the writeable set is a
    /// hard failure. The auto-generated key is never part of the SET list.
    pub fn update(
        &self,
        entity: &EntityType,
        keys: &[Value],
        changes: &IndexMap<String, Value>,
    ) -> Result<CompiledStmt> {
        let filter = key_filter(entity, keys)?;

        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = self.formatter(&mut sql, &mut params, &entity.table);

        let mut assignments = Vec::new();
        for (name, value) in changes {
            if entity.auto_key.as_deref() == Some(name.as_str()) {
                continue;
            }
            let field = entity.check_writeable(name)?;
            field.validate(value)?;
            let column = physical_column(entity, name)?;
            let placeholder = f.params.push(value, field.ty);
            assignments.push((column, placeholder));
        }

        if assignments.is_empty() {
            return Err(Error::query_shape("update requires at least one field"));
        }

        let set = assignments
            .into_iter()
            .map(|(column, placeholder)| (column, " = ", placeholder));
        fmt!(&mut f, "UPDATE " entity.table " SET " Comma(set) " WHERE " filter);

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns: vec![],
        })
    }

    /// Compile a DELETE filtered by the full key tuple.
    pub fn delete(&self, entity: &EntityType, keys: &[Value]) -> Result<CompiledStmt> {
        entity.check_deletable()?;
        let filter = key_filter(entity, keys)?;

        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = self.formatter(&mut sql, &mut params, &entity.table);

        fmt!(&mut f, "DELETE FROM " entity.table " WHERE " filter);

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns: vec![],
        })
    }

    /// Compile the collection statement used by the lazy-collection upgrade
    /// path.
    pub fn collection(
        &self,
        entity: &EntityType,
        projection: Projection,
        filter: Option<&WhereList>,
        order: &CollectionOrder,
    ) -> Result<CompiledStmt> {
        let mut params = TypedParams::default();
        let mut sql = String::new();
        let mut f = self.formatter(&mut sql, &mut params, &entity.table);

        let (items, columns): (Vec<_>, Vec<_>) = match projection {
            Projection::Full => entity
                .fields
                .values()
                .map(|field| (Printable::Field(field.reference()), field.name.clone()))
                .unzip(),
            Projection::KeyOnly => entity
                .key_fields()
                .into_iter()
                .map(|field| (Printable::Field(field.reference()), field.name.clone()))
                .unzip(),
            Projection::Count => (
                vec![Printable::Raw("COUNT(*)".to_string())],
                vec!["count".to_string()],
            ),
        };

        let select = items.iter().zip(columns.iter()).map(|(expr, name)| SelectItem {
            expr,
            alias: match expr {
                Printable::Field(field) if !field.is_trivial() => Some(name.as_str()),
                _ => None,
            },
        });

        fmt!(&mut f, "SELECT " Comma(select) " FROM " entity.table);

        if let Some(filter) = filter {
            if !filter.is_empty() {
                fmt!(&mut f, " WHERE " filter);
            }
        }

        if !matches!(projection, Projection::Count) {
            match order {
                CollectionOrder::Keys => {
                    let by = entity
                        .key_fields()
                        .into_iter()
                        .map(|field| (field.reference().aliased(&entity.table), " ASC"))
                        .collect::<Vec<_>>();
                    fmt!(&mut f, " ORDER BY " Comma(by.iter().map(|(sql, dir)| (sql, *dir))));
                }
                CollectionOrder::Explicit(entries) => {
                    let mut by = Vec::new();
                    for (name, direction) in entries {
                        let field = entity.field(name)?;
                        by.push((field.reference().aliased(&entity.table), *direction));
                    }
                    let by = by
                        .iter()
                        .map(|(sql, direction)| (sql, " ", direction.as_str()));
                    fmt!(&mut f, " ORDER BY " Comma(by));
                }
                CollectionOrder::Random => {
                    fmt!(&mut f, " ORDER BY " self.flavor().random_marker());
                }
            }
        }

        Ok(CompiledStmt {
            sql,
            params: params.values,
            param_types: params.types,
            columns,
        })
    }

    fn formatter<'a>(
        &'a self,
        dst: &'a mut String,
        params: &'a mut TypedParams,
        alias: &str,
    ) -> Formatter<'a, TypedParams> {
        Formatter {
            serializer: self,
            dst,
            params,
            alias: alias.to_string(),
        }
    }
}

/// Build the full-key-tuple filter for one entity.
fn key_filter(entity: &EntityType, keys: &[Value]) -> Result<WhereList> {
    if keys.len() != entity.keys.len() {
        return Err(Error::query_shape(format!(
            "entity `{}` has {} key field(s), {} value(s) supplied",
            entity.name,
            entity.keys.len(),
            keys.len()
        )));
    }

    let mut filter = WhereList::new();
    for (field, value) in entity.key_fields().into_iter().zip(keys) {
        filter.and(WherePart::eq(field.reference(), value.clone()))?;
    }
    Ok(filter)
}

/// The bare column name of a field used in a SET list or INSERT column list.
fn physical_column<'a>(entity: &'a EntityType, name: &str) -> Result<&'a str> {
    let field = entity.field(name)?;
    field.plain_column().ok_or_else(|| {
        Error::configuration(format!(
            "field `{}` of `{}` is a computed expression and cannot be written",
            name, entity.name
        ))
    })
}
