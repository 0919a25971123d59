//! Migration script assembly.
//!
//! Pairs the compiled "apply" (`up`) and "reverse" (`down`) directions under a
//! script name. Rendering to text is left to a [`ScriptDialect`].

use serde::Serialize;
use tracing::debug;

use crate::compiler::StatementCompiler;
use crate::dialect::ScriptDialect;
use crate::diff::ChangeSet;
use crate::error::{BlueprintError, Result};
use crate::operations::CompiledChangeSet;

/// A named script with compiled apply and reverse procedures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationScript {
    name: String,
    up: CompiledChangeSet,
    down: CompiledChangeSet,
}

impl MigrationScript {
    /// Script (class) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The apply procedure.
    #[must_use]
    pub const fn up(&self) -> &CompiledChangeSet {
        &self.up
    }

    /// The reverse procedure.
    #[must_use]
    pub const fn down(&self) -> &CompiledChangeSet {
        &self.down
    }

    /// Renders the script text.
    #[must_use]
    pub fn render(&self, dialect: &dyn ScriptDialect) -> String {
        dialect.render_script(self)
    }
}

/// Compiles both directions of a migration into a [`MigrationScript`].
#[derive(Debug)]
pub struct ScriptAssembler<'c, 'r> {
    compiler: &'c StatementCompiler<'r>,
}

impl<'c, 'r> ScriptAssembler<'c, 'r> {
    /// Creates an assembler using `compiler` for both directions.
    #[must_use]
    pub const fn new(compiler: &'c StatementCompiler<'r>) -> Self {
        Self { compiler }
    }

    /// Compiles `up` and `down` under the script name `name`.
    ///
    /// # Errors
    ///
    /// Fails without producing anything if the name is not a valid identifier
    /// or either direction fails to compile.
    pub fn assemble(&self, name: &str, up: &ChangeSet, down: &ChangeSet) -> Result<MigrationScript> {
        validate_script_name(name)?;

        debug!(script = name, "compiling apply direction");
        let up = self.compiler.compile(up)?;
        debug!(script = name, "compiling reverse direction");
        let down = self.compiler.compile(down)?;

        Ok(MigrationScript {
            name: name.to_string(),
            up,
            down,
        })
    }
}

/// Checks that `name` can be used as a class identifier.
///
/// # Errors
///
/// Returns [`BlueprintError::MalformedInput`] for an empty name or one that
/// is not made of ASCII letters, digits and underscores.
pub fn validate_script_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|first| {
        (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    });

    if valid {
        Ok(())
    } else {
        Err(BlueprintError::malformed(format!(
            "script name '{name}' is not a valid identifier"
        )))
    }
}
