//! Relationship resolution.
//!
//! A `belongsTo` descriptor names a related entity, not a table. The
//! [`EntityRegistry`] maps that identifier to the entity's storage name and
//! primary key so the resolver can emit a complete foreign-key constraint.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::diff::BelongsTo;
use crate::error::{BlueprintError, Result};
use crate::operations::{SchemaCall, Statement};

/// Storage facts about a related entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    /// Primary-key column name.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Table the entity is stored in.
    pub table: String,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityInfo {
    /// Creates entity info.
    #[must_use]
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            table: table.into(),
        }
    }
}

/// Lookup of entity storage facts by identifier.
///
/// Lookups must be synchronous and free of side effects; a failed lookup
/// aborts the compilation that asked for it.
pub trait EntityRegistry: Send + Sync {
    /// Returns the storage facts of `model`.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::UnknownModel`] if `model` is not known.
    fn lookup(&self, model: &str) -> Result<EntityInfo>;
}

/// An in-memory registry, usually loaded from a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticRegistry {
    entities: HashMap<String, EntityInfo>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity.
    #[must_use]
    pub fn entity(mut self, model: impl Into<String>, info: EntityInfo) -> Self {
        self.entities.insert(model.into(), info);
        self
    }

    /// Parses a registry document of the form
    /// `{ "User": { "table": "users", "primaryKey": "id" } }`.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Serialization`] if the document is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a registry file.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Io`] if the file cannot be read, otherwise as
    /// [`StaticRegistry::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityRegistry for StaticRegistry {
    fn lookup(&self, model: &str) -> Result<EntityInfo> {
        self.entities
            .get(model)
            .cloned()
            .ok_or_else(|| BlueprintError::UnknownModel(model.to_string()))
    }
}

/// Emits foreign-key statements for belongs-to relationships.
#[derive(Clone, Copy)]
pub struct RelationshipResolver<'r> {
    registry: &'r dyn EntityRegistry,
}

impl std::fmt::Debug for RelationshipResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipResolver").finish_non_exhaustive()
    }
}

impl<'r> RelationshipResolver<'r> {
    /// Creates a resolver over the given registry.
    #[must_use]
    pub const fn new(registry: &'r dyn EntityRegistry) -> Self {
        Self { registry }
    }

    /// Resolves a relationship into a foreign-key constraint statement.
    ///
    /// The constrained column is the relationship's foreign key; `name` is the
    /// declared column name and is only used for tracing.
    ///
    /// # Errors
    ///
    /// Returns the registry's error, [`BlueprintError::UnknownModel`] for the
    /// registry shipped here.
    pub fn resolve_foreign_key(&self, name: &str, belongs_to: &BelongsTo) -> Result<Statement> {
        let entity = self.registry.lookup(&belongs_to.model)?;
        trace!(
            column = name,
            model = %belongs_to.model,
            table = %entity.table,
            "resolved relationship"
        );
        Ok(Statement::foreign(
            belongs_to.foreign_key.clone(),
            entity.primary_key,
            entity.table,
        ))
    }
}

/// Builds the disable / drop / enable sequence for the given foreign keys.
///
/// Returns no statements when `keys` is empty.
#[must_use]
pub fn drop_foreign_keys(keys: &[String], connection: &str) -> Vec<Statement> {
    if keys.is_empty() {
        return Vec::new();
    }
    vec![
        Statement::Schema(SchemaCall::disable_foreign_keys(connection)),
        Statement::DropForeign {
            columns: keys.to_vec(),
        },
        Statement::Schema(SchemaCall::enable_foreign_keys(connection)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StaticRegistry {
        StaticRegistry::new().entity("User", EntityInfo::new("users", "id"))
    }

    #[test]
    fn test_resolve_foreign_key() {
        let registry = registry();
        let resolver = RelationshipResolver::new(&registry);
        let stmt = resolver
            .resolve_foreign_key("author", &BelongsTo::new("author_id", "User"))
            .unwrap();

        assert_eq!(stmt, Statement::foreign("author_id", "id", "users"));
    }

    #[test]
    fn test_unknown_model() {
        let registry = registry();
        let resolver = RelationshipResolver::new(&registry);
        let err = resolver
            .resolve_foreign_key("team_id", &BelongsTo::new("team_id", "Team"))
            .unwrap_err();

        assert!(matches!(err, BlueprintError::UnknownModel(m) if m == "Team"));
    }

    #[test]
    fn test_drop_foreign_keys_sequence() {
        let stmts = drop_foreign_keys(&["author_id".to_string(), "editor_id".to_string()], "main");

        assert_eq!(stmts.len(), 3);
        assert_eq!(
            stmts[0],
            Statement::Schema(SchemaCall::disable_foreign_keys("main"))
        );
        assert_eq!(
            stmts[1],
            Statement::DropForeign {
                columns: vec!["author_id".to_string(), "editor_id".to_string()]
            }
        );
        assert_eq!(
            stmts[2],
            Statement::Schema(SchemaCall::enable_foreign_keys("main"))
        );
    }

    #[test]
    fn test_drop_no_keys() {
        assert!(drop_foreign_keys(&[], "main").is_empty());
    }

    #[test]
    fn test_registry_document_defaults_primary_key() {
        let registry = StaticRegistry::from_json(
            r#"{"User": {"table": "users"}, "Post": {"table": "posts", "primaryKey": "uuid"}}"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("User").unwrap(), EntityInfo::new("users", "id"));
        assert_eq!(registry.lookup("Post").unwrap().primary_key, "uuid");
    }

    #[test]
    fn test_registry_document_requires_table() {
        let err = StaticRegistry::from_json(r#"{"User": {"primaryKey": "id"}}"#).unwrap_err();
        assert!(matches!(err, BlueprintError::Serialization(_)));
    }
}
