//! Error types for change-set compilation.

use std::fmt;

/// The three top-level buckets of a change-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Tables or columns that are new.
    Created,
    /// Tables or columns that already exist and change.
    Updated,
    /// Tables or columns that are removed.
    Deleted,
}

impl Bucket {
    /// Returns the document key of this bucket.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while compiling a change-set into a script.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// The change-set document is structurally invalid.
    #[error("Malformed change set: {0}")]
    MalformedInput(String),

    /// A table name appears in more than one top-level bucket.
    #[error("Table '{table}' appears in both the '{first}' and '{second}' buckets")]
    ConflictingTable {
        /// The table name.
        table: String,
        /// The bucket where the table was seen first.
        first: Bucket,
        /// The bucket where it was seen again.
        second: Bucket,
    },

    /// A column sets both a literal and a raw default.
    #[error("Column '{column}' on table '{table}' sets both 'default' and 'rawDefault'")]
    AmbiguousDefault {
        /// Table owning the column.
        table: String,
        /// Column name.
        column: String,
    },

    /// A `belongsTo` model is not known to the entity registry.
    #[error("Cannot resolve related model '{0}'")]
    UnknownModel(String),

    /// IO error (reading change-set or registry files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BlueprintError {
    /// Shorthand for a [`BlueprintError::MalformedInput`].
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, BlueprintError>;
