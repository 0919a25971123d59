//! Change-set compilation.
//!
//! [`StatementCompiler`] walks one direction of a change-set and emits its
//! statements in four fixed passes:
//!
//! 1. created tables, each in its own create block;
//! 2. updated tables, each in its own alter block (created, updated, then
//!    deleted columns);
//! 3. relationships: foreign keys for every created or updated column with a
//!    `belongsTo`, once every table exists;
//! 4. deleted tables, each dropped between its own constraint toggle.
//!
//! Compilation is all-or-nothing: the input is validated up front and any
//! resolution failure aborts the call.

use tracing::{debug, warn};

use crate::diff::{ChangeSet, TableDiff};
use crate::error::{BlueprintError, Result};
use crate::field::compile_fields;
use crate::operations::{CompiledChangeSet, Pass, PassKind, SchemaCall, StatementGroup};
use crate::ordered::OrderedMap;
use crate::relations::{EntityRegistry, RelationshipResolver};

/// Comment placed before the relationships pass.
pub const RELATIONSHIPS_COMMENT: &str = "Adding foreign keys";

/// Options for the compiler.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Emit both `default` and `rawDefault` when a column sets both, instead
    /// of rejecting the change-set.
    pub allow_ambiguous_defaults: bool,
}

impl CompilerOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerates columns that set both a literal and a raw default.
    #[must_use]
    pub const fn with_ambiguous_defaults(mut self) -> Self {
        self.allow_ambiguous_defaults = true;
        self
    }
}

/// Compiles change-sets into ordered statement groups.
#[derive(Debug)]
pub struct StatementCompiler<'r> {
    resolver: RelationshipResolver<'r>,
    options: CompilerOptions,
}

impl<'r> StatementCompiler<'r> {
    /// Creates a compiler with default options.
    #[must_use]
    pub const fn new(registry: &'r dyn EntityRegistry) -> Self {
        Self::with_options(
            registry,
            CompilerOptions {
                allow_ambiguous_defaults: false,
            },
        )
    }

    /// Creates a compiler with custom options.
    #[must_use]
    pub const fn with_options(registry: &'r dyn EntityRegistry, options: CompilerOptions) -> Self {
        Self {
            resolver: RelationshipResolver::new(registry),
            options,
        }
    }

    /// Compiles one direction of a change-set.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::MalformedInput`] or
    /// [`BlueprintError::ConflictingTable`] for invalid input,
    /// [`BlueprintError::AmbiguousDefault`] for a column with both defaults
    /// (unless tolerated), and [`BlueprintError::UnknownModel`] when a
    /// relationship cannot be resolved.
    pub fn compile(&self, changes: &ChangeSet) -> Result<CompiledChangeSet> {
        changes.validate()?;
        self.check_defaults(changes)?;

        let passes = [
            (PassKind::CreatedTables, created_tables(changes)),
            (PassKind::UpdatedTables, updated_tables(changes)),
            (PassKind::Relationships, self.relationships(changes)?),
            (PassKind::DeletedTables, deleted_tables(changes)),
        ];

        let mut compiled = CompiledChangeSet::default();
        for (kind, groups) in passes {
            debug!(pass = ?kind, groups = groups.len(), "compiled pass");
            if !groups.is_empty() {
                compiled.passes.push(Pass { kind, groups });
            }
        }
        Ok(compiled)
    }

    fn check_defaults(&self, changes: &ChangeSet) -> Result<()> {
        for (table, diff) in defining_tables(changes) {
            for (column, spec) in diff.defined_columns() {
                if !spec.has_ambiguous_default() {
                    continue;
                }
                if !self.options.allow_ambiguous_defaults {
                    return Err(BlueprintError::AmbiguousDefault {
                        table: table.to_string(),
                        column: column.to_string(),
                    });
                }
                warn!(
                    table,
                    column, "column sets both 'default' and 'rawDefault', emitting both"
                );
            }
        }
        Ok(())
    }

    fn relationships(&self, changes: &ChangeSet) -> Result<Vec<StatementGroup>> {
        let mut groups = Vec::new();

        for (table, diff) in defining_tables(changes) {
            let mut statements = Vec::new();
            for (column, spec) in diff.defined_columns() {
                if let Some(rel) = &spec.belongs_to {
                    statements.push(self.resolver.resolve_foreign_key(column, rel)?);
                }
            }

            if !statements.is_empty() {
                debug!(table, keys = statements.len(), "add foreign keys");
                groups.push(StatementGroup::AlterTable {
                    connection: diff.connection.clone(),
                    table: table.to_string(),
                    statements,
                });
            }
        }

        if !groups.is_empty() {
            groups.insert(0, StatementGroup::Comment(RELATIONSHIPS_COMMENT.to_string()));
        }
        Ok(groups)
    }
}

fn created_tables(changes: &ChangeSet) -> Vec<StatementGroup> {
    tables(changes.created.as_ref())
        .map(|(table, diff)| {
            debug!(table, connection = %diff.connection, "create table");
            StatementGroup::CreateTable {
                connection: diff.connection.clone(),
                table: table.to_string(),
                statements: compile_fields(diff),
            }
        })
        .collect()
}

fn updated_tables(changes: &ChangeSet) -> Vec<StatementGroup> {
    tables(changes.updated.as_ref())
        .map(|(table, diff)| {
            debug!(table, connection = %diff.connection, "alter table");
            StatementGroup::AlterTable {
                connection: diff.connection.clone(),
                table: table.to_string(),
                statements: compile_fields(diff),
            }
        })
        .collect()
}

fn deleted_tables(changes: &ChangeSet) -> Vec<StatementGroup> {
    tables(changes.deleted.as_ref())
        .map(|(table, diff)| {
            debug!(table, connection = %diff.connection, "drop table");
            StatementGroup::Schema(vec![
                SchemaCall::disable_foreign_keys(diff.connection.clone()),
                SchemaCall::drop_table(diff.connection.clone(), table),
                SchemaCall::enable_foreign_keys(diff.connection.clone()),
            ])
        })
        .collect()
}

fn tables(bucket: Option<&OrderedMap<TableDiff>>) -> impl Iterator<Item = (&str, &TableDiff)> {
    bucket.into_iter().flat_map(OrderedMap::iter)
}

/// Created then updated tables: the ones whose columns are defined here.
fn defining_tables(changes: &ChangeSet) -> impl Iterator<Item = (&str, &TableDiff)> {
    tables(changes.created.as_ref()).chain(tables(changes.updated.as_ref()))
}
