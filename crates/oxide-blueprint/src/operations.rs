//! Schema-mutation statements.
//!
//! This module defines the intermediate representation the compiler produces:
//! what each statement does, independent of how a dialect prints it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Argument of a column modifier call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierArg {
    /// Called with no argument.
    None,
    /// Literal data, serialized by the dialect.
    Literal(Value),
    /// An expression inserted verbatim.
    Raw(String),
}

/// A modifier applied to a column expression (`->nullable(true)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    /// Builder method name.
    pub method: String,
    /// Argument passed to it.
    pub arg: ModifierArg,
}

impl Modifier {
    /// Creates a modifier.
    #[must_use]
    pub fn new(method: impl Into<String>, arg: ModifierArg) -> Self {
        Self {
            method: method.into(),
            arg,
        }
    }
}

/// A column definition expression: type constructor plus modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnExpr {
    /// Type constructor (`string`, `integer`, ...).
    pub column_type: String,
    /// Constructor arguments; the first is always the column name.
    pub args: Vec<Value>,
    /// Modifiers in application order.
    pub modifiers: Vec<Modifier>,
    /// Whether this redefines an existing column instead of adding one.
    pub change: bool,
}

impl ColumnExpr {
    /// Returns the column name (first constructor argument).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }

    /// Returns true if a modifier with this method name is applied.
    #[must_use]
    pub fn has_modifier(&self, method: &str) -> bool {
        self.modifiers.iter().any(|m| m.method == method)
    }
}

/// A connection-level schema call (outside any table blueprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaCall {
    /// Turn foreign-key constraint checking off.
    DisableForeignKeyConstraints {
        /// Connection name.
        connection: String,
    },
    /// Turn foreign-key constraint checking back on.
    EnableForeignKeyConstraints {
        /// Connection name.
        connection: String,
    },
    /// Drop a whole table.
    DropTable {
        /// Connection name.
        connection: String,
        /// Table name.
        table: String,
    },
}

impl SchemaCall {
    /// Creates a `DisableForeignKeyConstraints` call.
    #[must_use]
    pub fn disable_foreign_keys(connection: impl Into<String>) -> Self {
        Self::DisableForeignKeyConstraints {
            connection: connection.into(),
        }
    }

    /// Creates an `EnableForeignKeyConstraints` call.
    #[must_use]
    pub fn enable_foreign_keys(connection: impl Into<String>) -> Self {
        Self::EnableForeignKeyConstraints {
            connection: connection.into(),
        }
    }

    /// Creates a `DropTable` call.
    #[must_use]
    pub fn drop_table(connection: impl Into<String>, table: impl Into<String>) -> Self {
        Self::DropTable {
            connection: connection.into(),
            table: table.into(),
        }
    }

    /// Returns the connection the call is scoped to.
    #[must_use]
    pub fn connection(&self) -> &str {
        match self {
            Self::DisableForeignKeyConstraints { connection }
            | Self::EnableForeignKeyConstraints { connection }
            | Self::DropTable { connection, .. } => connection,
        }
    }

    /// Returns a human-readable description of this call.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::DisableForeignKeyConstraints { connection } => {
                format!("Disable foreign key constraints on '{connection}'")
            }
            Self::EnableForeignKeyConstraints { connection } => {
                format!("Enable foreign key constraints on '{connection}'")
            }
            Self::DropTable { connection, table } => {
                format!("Drop table '{table}' on '{connection}'")
            }
        }
    }
}

/// A single statement inside a table block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Add or redefine a column.
    Column(ColumnExpr),

    /// Drop a column.
    DropColumn {
        /// Column name.
        name: String,
    },

    /// Drop the foreign key(s) defined on the given columns.
    DropForeign {
        /// Local columns whose constraints are dropped.
        columns: Vec<String>,
    },

    /// Add a foreign-key constraint.
    Foreign {
        /// Local column.
        column: String,
        /// Referenced column (the related entity's primary key).
        references: String,
        /// Referenced table.
        on: String,
    },

    /// A connection-level call emitted between blueprint statements.
    Schema(SchemaCall),
}

impl Statement {
    /// Creates a `DropColumn` statement.
    #[must_use]
    pub fn drop_column(name: impl Into<String>) -> Self {
        Self::DropColumn { name: name.into() }
    }

    /// Creates a `Foreign` statement.
    #[must_use]
    pub fn foreign(
        column: impl Into<String>,
        references: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        Self::Foreign {
            column: column.into(),
            references: references.into(),
            on: on.into(),
        }
    }

    /// Returns a human-readable description of this statement.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Column(expr) => {
                let verb = if expr.change { "Change" } else { "Add" };
                format!("{verb} column '{}'", expr.name().unwrap_or("?"))
            }
            Self::DropColumn { name } => format!("Drop column '{name}'"),
            Self::DropForeign { columns } => {
                format!("Drop foreign key on '{}'", columns.join("', '"))
            }
            Self::Foreign {
                column,
                references,
                on,
            } => format!("Add foreign key '{column}' -> '{on}.{references}'"),
            Self::Schema(call) => call.description(),
        }
    }
}

/// A block of statements scoped to one table and one connection, or a
/// free-standing entry of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementGroup {
    /// Create a table and define its columns.
    CreateTable {
        /// Connection name.
        connection: String,
        /// Table name.
        table: String,
        /// Statements in the table blueprint.
        statements: Vec<Statement>,
    },

    /// Modify an existing table.
    AlterTable {
        /// Connection name.
        connection: String,
        /// Table name.
        table: String,
        /// Statements in the table blueprint.
        statements: Vec<Statement>,
    },

    /// Connection-level calls with no table blueprint.
    Schema(Vec<SchemaCall>),

    /// A comment line.
    Comment(String),
}

impl StatementGroup {
    /// Returns the table the group is scoped to, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::CreateTable { table, .. } | Self::AlterTable { table, .. } => Some(table),
            Self::Schema(calls) => calls.iter().find_map(|call| match call {
                SchemaCall::DropTable { table, .. } => Some(table.as_str()),
                _ => None,
            }),
            Self::Comment(_) => None,
        }
    }

    /// Number of executable statements in the group.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        match self {
            Self::CreateTable { statements, .. } | Self::AlterTable { statements, .. } => {
                statements.len()
            }
            Self::Schema(calls) => calls.len(),
            Self::Comment(_) => 0,
        }
    }
}

/// The four compilation passes, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassKind {
    /// New tables.
    CreatedTables,
    /// Altered tables.
    UpdatedTables,
    /// Foreign keys added after all tables exist.
    Relationships,
    /// Dropped tables.
    DeletedTables,
}

impl PassKind {
    /// Whether groups of this pass are separated by blank lines when rendered.
    #[must_use]
    pub const fn separates_groups(self) -> bool {
        !matches!(self, Self::Relationships)
    }
}

/// The non-empty output of one compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pass {
    /// Which pass produced the groups.
    pub kind: PassKind,
    /// Groups in emission order.
    pub groups: Vec<StatementGroup>,
}

/// A compiled change-set: its non-empty passes in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledChangeSet {
    /// Non-empty passes.
    pub passes: Vec<Pass>,
}

impl CompiledChangeSet {
    /// Returns true if nothing was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Returns the pass of the given kind, if it produced anything.
    #[must_use]
    pub fn pass(&self, kind: PassKind) -> Option<&Pass> {
        self.passes.iter().find(|p| p.kind == kind)
    }

    /// Iterates over all groups across passes.
    pub fn groups(&self) -> impl Iterator<Item = &StatementGroup> {
        self.passes.iter().flat_map(|p| p.groups.iter())
    }

    /// Total number of executable statements.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.groups().map(StatementGroup::statement_count).sum()
    }
}
