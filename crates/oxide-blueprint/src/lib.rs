//! Reversible schema-builder migrations from declarative change-sets.
//!
//! `oxide-blueprint` takes a description of schema changes (tables and columns
//! created, updated or deleted, including belongs-to relationships) and
//! compiles it into an ordered, dependency-safe list of schema-mutation
//! statements, emitted as a migration script with `up` and `down` procedures.
//!
//! # Architecture
//!
//! - **Diff model** - [`ChangeSet`], [`TableDiff`], [`ColumnSpec`], [`ColumnRef`]
//! - **Compiler** - orders created tables, updated tables, foreign keys and
//!   dropped tables, with constraint toggles around destructive steps
//! - **Field compiler** - renders one column with its modifiers in fixed order
//! - **Relationships** - resolves `belongsTo` through an [`EntityRegistry`]
//! - **Script** - pairs both directions under a script name
//! - **Dialect** - prints the statement IR in the target builder syntax
//!
//! # Example
//!
//! ```rust
//! use oxide_blueprint::prelude::*;
//!
//! let registry = StaticRegistry::new().entity("User", EntityInfo::new("users", "id"));
//!
//! let up = ChangeSet::new().updated_table(
//!     "posts",
//!     TableDiff::new("main").created_column(
//!         "author_id",
//!         ColumnSpec::new("integer").belongs_to("author_id", "User"),
//!     ),
//! );
//! let down = ChangeSet::new().updated_table(
//!     "posts",
//!     TableDiff::new("main").deleted_column("author_id", ColumnRef::belongs_to("author_id", "User")),
//! );
//!
//! let script = generate_script("AddAuthorToPosts", &up, &down, &registry).unwrap();
//! assert!(script.contains("$table->integer(\"author_id\");"));
//! assert!(script.contains("$table->foreign('author_id')->references('id')->on('users');"));
//! assert!(script.contains("$table->dropForeign(['author_id']);"));
//! ```

pub mod compiler;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod field;
pub mod operations;
pub mod ordered;
pub mod relations;
pub mod script;

pub use compiler::{CompilerOptions, StatementCompiler};
pub use dialect::{BlueprintDialect, ScriptDialect};
pub use diff::{BelongsTo, ChangeSet, ColumnRef, ColumnSpec, TableDiff};
pub use error::{BlueprintError, Result};
pub use relations::{EntityInfo, EntityRegistry, StaticRegistry};
pub use script::{MigrationScript, ScriptAssembler};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::compiler::{CompilerOptions, StatementCompiler};
    pub use crate::dialect::{BlueprintDialect, ScriptDialect};
    pub use crate::diff::{BelongsTo, ChangeSet, ColumnRef, ColumnSpec, TableDiff};
    pub use crate::error::{BlueprintError, Bucket, Result};
    pub use crate::field::{FieldMode, compile_deleted_field, compile_field};
    pub use crate::operations::{
        ColumnExpr, CompiledChangeSet, Modifier, ModifierArg, Pass, PassKind, SchemaCall,
        Statement, StatementGroup,
    };
    pub use crate::ordered::OrderedMap;
    pub use crate::relations::{EntityInfo, EntityRegistry, RelationshipResolver, StaticRegistry};
    pub use crate::script::{MigrationScript, ScriptAssembler};
    pub use crate::generate_script;
}

/// Compiles both directions with default options and renders them with the
/// [`BlueprintDialect`].
///
/// # Errors
///
/// Returns the first error raised while validating the name or compiling
/// either direction.
pub fn generate_script(
    name: &str,
    up: &ChangeSet,
    down: &ChangeSet,
    registry: &dyn EntityRegistry,
) -> Result<String> {
    let compiler = StatementCompiler::new(registry);
    let script = ScriptAssembler::new(&compiler).assemble(name, up, down)?;
    Ok(script.render(&BlueprintDialect::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_script_is_deterministic() {
        let registry = StaticRegistry::new();
        let up = ChangeSet::new()
            .created_table(
                "users",
                TableDiff::new("main").created_column("id", ColumnSpec::new("increments")),
            )
            .created_table(
                "teams",
                TableDiff::new("main").created_column("id", ColumnSpec::new("increments")),
            );
        let down = ChangeSet::new()
            .deleted_table("users", TableDiff::new("main"))
            .deleted_table("teams", TableDiff::new("main"));

        let first = generate_script("CreateUsersAndTeams", &up, &down, &registry).unwrap();
        let second = generate_script("CreateUsersAndTeams", &up, &down, &registry).unwrap();
        assert_eq!(first, second);
        assert!(first.find("'users'").unwrap() < first.find("'teams'").unwrap());
    }

    #[test]
    fn test_generate_script_rejects_bad_name() {
        let registry = StaticRegistry::new();
        let err = generate_script("not a class", &ChangeSet::new(), &ChangeSet::new(), &registry)
            .unwrap_err();
        assert!(matches!(err, BlueprintError::MalformedInput(_)));
    }
}
