//! Change-set representation types.
//!
//! A [`ChangeSet`] describes one direction of a migration: the tables that are
//! created, updated or deleted, and for each table the columns that are
//! created, updated or deleted. Change-sets are produced by an external diff
//! supplier and are read-only input to the compiler.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{BlueprintError, Bucket, Result};
use crate::ordered::OrderedMap;

/// A belongs-to relationship carried by a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BelongsTo {
    /// Name of the local foreign-key column.
    pub foreign_key: String,
    /// Identifier of the referenced entity, looked up in the entity registry.
    pub model: String,
}

impl BelongsTo {
    /// Creates a new relationship descriptor.
    #[must_use]
    pub fn new(foreign_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            foreign_key: foreign_key.into(),
            model: model.into(),
        }
    }
}

/// Definition of a created or updated column.
///
/// Modifier values are kept as JSON so that they render exactly as the diff
/// supplier wrote them (`true`, `"idx_name"`, `0`, ...). A `null` value counts
/// as an absent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    /// Column type constructor (`increments`, `string`, `timestamp`, ...).
    #[serde(rename = "type")]
    pub column_type: String,
    /// Extra constructor arguments after the column name.
    #[serde(
        default,
        deserialize_with = "deserialize_type_args",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub type_args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<Value>,
    /// Literal default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Default given as an unescaped expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<Value>,
    /// Presence alone matters; the value is never rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_current: Option<Value>,
    /// Relationship to another entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs_to: Option<BelongsTo>,
}

impl ColumnSpec {
    /// Creates a column of the given type with no modifiers.
    #[must_use]
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            column_type: column_type.into(),
            type_args: Vec::new(),
            index: None,
            unique: None,
            default: None,
            raw_default: None,
            primary: None,
            unsigned: None,
            nullable: None,
            use_current: None,
            belongs_to: None,
        }
    }

    /// Appends a type constructor argument.
    #[must_use]
    pub fn type_arg(mut self, arg: impl Into<Value>) -> Self {
        self.type_args.push(arg.into());
        self
    }

    #[must_use]
    pub fn index(mut self, value: impl Into<Value>) -> Self {
        self.index = Some(value.into());
        self
    }

    #[must_use]
    pub fn unique(mut self, value: impl Into<Value>) -> Self {
        self.unique = Some(value.into());
        self
    }

    /// Sets a literal default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets a raw default expression.
    #[must_use]
    pub fn raw_default(mut self, expr: impl Into<String>) -> Self {
        self.raw_default = Some(expr.into());
        self
    }

    #[must_use]
    pub fn primary(mut self, value: impl Into<Value>) -> Self {
        self.primary = Some(value.into());
        self
    }

    #[must_use]
    pub fn unsigned(mut self, value: impl Into<Value>) -> Self {
        self.unsigned = Some(value.into());
        self
    }

    #[must_use]
    pub fn nullable(mut self, value: impl Into<Value>) -> Self {
        self.nullable = Some(value.into());
        self
    }

    #[must_use]
    pub fn use_current(mut self) -> Self {
        self.use_current = Some(Value::Bool(true));
        self
    }

    /// Attaches a belongs-to relationship.
    #[must_use]
    pub fn belongs_to(mut self, foreign_key: impl Into<String>, model: impl Into<String>) -> Self {
        self.belongs_to = Some(BelongsTo::new(foreign_key, model));
        self
    }

    /// Returns the name the column is rendered under.
    ///
    /// A belongs-to relationship overrides the declared name with its foreign key.
    #[must_use]
    pub fn rendered_name<'a>(&'a self, declared: &'a str) -> &'a str {
        self.belongs_to
            .as_ref()
            .map_or(declared, |rel| rel.foreign_key.as_str())
    }

    /// Returns true if both a literal and a raw default are set.
    #[must_use]
    pub const fn has_ambiguous_default(&self) -> bool {
        self.default.is_some() && self.raw_default.is_some()
    }
}

fn deserialize_type_args<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// What the compiler needs to know about a deleted column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    /// Relationship whose foreign key must be dropped first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs_to: Option<BelongsTo>,
}

impl ColumnRef {
    /// A deleted column with no relationship.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A deleted column whose foreign key must be dropped.
    #[must_use]
    pub fn belongs_to(foreign_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            belongs_to: Some(BelongsTo::new(foreign_key, model)),
        }
    }
}

/// Changes to a single table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    /// Name of the data-store connection the table lives on.
    pub connection: String,
    /// Columns added to the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<OrderedMap<ColumnSpec>>,
    /// Columns whose definition changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<OrderedMap<ColumnSpec>>,
    /// Columns removed from the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<OrderedMap<ColumnRef>>,
}

impl TableDiff {
    /// Creates a table diff with no column buckets.
    #[must_use]
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            created: None,
            updated: None,
            deleted: None,
        }
    }

    /// Adds a created column.
    #[must_use]
    pub fn created_column(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        self.created.get_or_insert_with(OrderedMap::new).insert(name, spec);
        self
    }

    /// Adds an updated column.
    #[must_use]
    pub fn updated_column(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        self.updated.get_or_insert_with(OrderedMap::new).insert(name, spec);
        self
    }

    /// Adds a deleted column.
    #[must_use]
    pub fn deleted_column(mut self, name: impl Into<String>, column: ColumnRef) -> Self {
        self.deleted.get_or_insert_with(OrderedMap::new).insert(name, column);
        self
    }

    /// Returns true if any column bucket is present.
    #[must_use]
    pub const fn has_columns(&self) -> bool {
        self.created.is_some() || self.updated.is_some() || self.deleted.is_some()
    }

    /// Iterates over created then updated columns.
    pub fn defined_columns(&self) -> impl Iterator<Item = (&str, &ColumnSpec)> {
        self.created
            .iter()
            .chain(self.updated.iter())
            .flat_map(OrderedMap::iter)
    }
}

/// One direction of a migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Tables to create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<OrderedMap<TableDiff>>,
    /// Tables to alter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<OrderedMap<TableDiff>>,
    /// Tables to drop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<OrderedMap<TableDiff>>,
}

impl ChangeSet {
    /// Creates an empty change-set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the `created` bucket.
    #[must_use]
    pub fn created_table(mut self, name: impl Into<String>, table: TableDiff) -> Self {
        self.created.get_or_insert_with(OrderedMap::new).insert(name, table);
        self
    }

    /// Adds a table to the `updated` bucket.
    #[must_use]
    pub fn updated_table(mut self, name: impl Into<String>, table: TableDiff) -> Self {
        self.updated.get_or_insert_with(OrderedMap::new).insert(name, table);
        self
    }

    /// Adds a table to the `deleted` bucket.
    #[must_use]
    pub fn deleted_table(mut self, name: impl Into<String>, table: TableDiff) -> Self {
        self.deleted.get_or_insert_with(OrderedMap::new).insert(name, table);
        self
    }

    /// Parses a change-set from a JSON document.
    ///
    /// # Errors
    ///
    /// Structural problems (a missing `type` or `connection`, duplicate keys,
    /// wrong value shapes) are reported as [`BlueprintError::MalformedInput`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BlueprintError::malformed(e.to_string()))
    }

    /// Reads and parses a change-set file.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Io`] if the file cannot be read, otherwise as
    /// [`ChangeSet::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns true if no bucket holds a table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets().all(|(_, tables)| tables.is_empty())
    }

    /// Iterates over the present table buckets in compilation order.
    pub fn buckets(&self) -> impl Iterator<Item = (Bucket, &OrderedMap<TableDiff>)> {
        [
            (Bucket::Created, self.created.as_ref()),
            (Bucket::Updated, self.updated.as_ref()),
            (Bucket::Deleted, self.deleted.as_ref()),
        ]
        .into_iter()
        .filter_map(|(bucket, tables)| tables.map(|t| (bucket, t)))
    }

    /// Checks the structural rules typed deserialization cannot express.
    ///
    /// - table names are disjoint across the three buckets;
    /// - every table names a non-empty connection;
    /// - created tables only carry `created` columns;
    /// - deleted tables carry no columns;
    /// - every defined column names a non-empty type;
    /// - relationship descriptors name both a foreign key and a model.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::ConflictingTable`] or
    /// [`BlueprintError::MalformedInput`] for the first rule broken.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<(&str, Bucket)> = Vec::new();

        for (bucket, tables) in self.buckets() {
            for (name, table) in tables {
                if let Some((_, first)) = seen.iter().find(|(n, _)| *n == name) {
                    return Err(BlueprintError::ConflictingTable {
                        table: name.to_string(),
                        first: *first,
                        second: bucket,
                    });
                }
                seen.push((name, bucket));

                validate_table(name, bucket, table)?;
            }
        }

        Ok(())
    }
}

fn validate_table(name: &str, bucket: Bucket, table: &TableDiff) -> Result<()> {
    if table.connection.trim().is_empty() {
        return Err(BlueprintError::malformed(format!(
            "table '{name}' in '{bucket}' has an empty connection"
        )));
    }

    match bucket {
        Bucket::Created if table.updated.is_some() || table.deleted.is_some() => {
            return Err(BlueprintError::malformed(format!(
                "created table '{name}' may only list created columns"
            )));
        }
        Bucket::Deleted if table.has_columns() => {
            return Err(BlueprintError::malformed(format!(
                "deleted table '{name}' may not list columns"
            )));
        }
        _ => {}
    }

    for (column, spec) in table.defined_columns() {
        if spec.column_type.trim().is_empty() {
            return Err(BlueprintError::malformed(format!(
                "column '{column}' on table '{name}' has an empty type"
            )));
        }
        if let Some(rel) = &spec.belongs_to {
            validate_relation(name, column, rel)?;
        }
    }

    for (column, deleted) in table.deleted.iter().flat_map(OrderedMap::iter) {
        if let Some(rel) = &deleted.belongs_to {
            validate_relation(name, column, rel)?;
        }
    }

    Ok(())
}

fn validate_relation(table: &str, column: &str, rel: &BelongsTo) -> Result<()> {
    if rel.foreign_key.trim().is_empty() || rel.model.trim().is_empty() {
        return Err(BlueprintError::malformed(format!(
            "column '{column}' on table '{table}' has an incomplete belongsTo"
        )));
    }
    Ok(())
}
