//! Column rendering.
//!
//! Turns one column of a [`TableDiff`] into blueprint statements. Modifiers are
//! applied from [`MODIFIERS`], whose order is the order they appear in output.

use serde_json::Value;
use tracing::trace;

use crate::diff::{ColumnRef, ColumnSpec, TableDiff};
use crate::operations::{ColumnExpr, Modifier, ModifierArg, Statement};
use crate::relations::drop_foreign_keys;

/// Whether a column expression adds a column or redefines an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// New column.
    Add,
    /// Existing column whose definition changes.
    Change,
}

/// One entry of the modifier table.
#[derive(Clone, Copy)]
pub struct ModifierRule {
    /// Key of the modifier in the change-set document.
    pub key: &'static str,
    /// Builder method the modifier renders as.
    pub method: &'static str,
    /// Extracts the modifier argument if the column sets it.
    pub select: fn(&ColumnSpec) -> Option<ModifierArg>,
}

/// Column modifiers in application order.
pub static MODIFIERS: &[ModifierRule] = &[
    ModifierRule {
        key: "index",
        method: "index",
        select: select_index,
    },
    ModifierRule {
        key: "unique",
        method: "unique",
        select: select_unique,
    },
    ModifierRule {
        key: "default",
        method: "default",
        select: select_default,
    },
    ModifierRule {
        key: "rawDefault",
        method: "default",
        select: select_raw_default,
    },
    ModifierRule {
        key: "primary",
        method: "primary",
        select: select_primary,
    },
    ModifierRule {
        key: "unsigned",
        method: "unsigned",
        select: select_unsigned,
    },
    ModifierRule {
        key: "nullable",
        method: "nullable",
        select: select_nullable,
    },
    ModifierRule {
        key: "useCurrent",
        method: "useCurrent",
        select: select_use_current,
    },
];

fn literal(value: Option<&Value>) -> Option<ModifierArg> {
    value.cloned().map(ModifierArg::Literal)
}

fn select_index(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.index.as_ref())
}

fn select_unique(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.unique.as_ref())
}

fn select_default(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.default.as_ref())
}

fn select_raw_default(spec: &ColumnSpec) -> Option<ModifierArg> {
    spec.raw_default.clone().map(ModifierArg::Raw)
}

fn select_primary(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.primary.as_ref())
}

fn select_unsigned(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.unsigned.as_ref())
}

fn select_nullable(spec: &ColumnSpec) -> Option<ModifierArg> {
    literal(spec.nullable.as_ref())
}

fn select_use_current(spec: &ColumnSpec) -> Option<ModifierArg> {
    spec.use_current.as_ref().map(|_| ModifierArg::None)
}

/// Renders a created or updated column as a column expression.
///
/// The first constructor argument is the relationship's foreign key when the
/// column belongs to another entity, the declared name otherwise.
#[must_use]
pub fn compile_field(name: &str, spec: &ColumnSpec, mode: FieldMode) -> ColumnExpr {
    let mut args = Vec::with_capacity(spec.type_args.len() + 1);
    args.push(Value::from(spec.rendered_name(name)));
    args.extend(spec.type_args.iter().cloned());

    let modifiers = MODIFIERS
        .iter()
        .filter_map(|rule| (rule.select)(spec).map(|arg| Modifier::new(rule.method, arg)))
        .collect();

    ColumnExpr {
        column_type: spec.column_type.clone(),
        args,
        modifiers,
        change: mode == FieldMode::Change,
    }
}

/// Renders an updated column.
///
/// A column with a relationship first drops its existing foreign key so the
/// column can be redefined; the new constraint is added by the relationships
/// pass.
#[must_use]
pub fn compile_updated_field(name: &str, spec: &ColumnSpec, connection: &str) -> Vec<Statement> {
    let mut out = spec.belongs_to.as_ref().map_or_else(Vec::new, |rel| {
        drop_foreign_keys(std::slice::from_ref(&rel.foreign_key), connection)
    });
    out.push(Statement::Column(compile_field(name, spec, FieldMode::Change)));
    out
}

/// Renders a deleted column: its foreign key is dropped before the column.
#[must_use]
pub fn compile_deleted_field(name: &str, column: &ColumnRef, connection: &str) -> Vec<Statement> {
    let keys: Vec<String> = column
        .belongs_to
        .iter()
        .map(|rel| rel.foreign_key.clone())
        .collect();

    let mut out = drop_foreign_keys(&keys, connection);
    out.push(Statement::drop_column(name));
    out
}

/// Renders every column bucket of a table: created, updated, then deleted.
#[must_use]
pub fn compile_fields(table: &TableDiff) -> Vec<Statement> {
    let mut out = Vec::new();

    if let Some(created) = &table.created {
        for (name, spec) in created {
            trace!(column = name, "add column");
            out.push(Statement::Column(compile_field(name, spec, FieldMode::Add)));
        }
    }

    if let Some(updated) = &table.updated {
        for (name, spec) in updated {
            trace!(column = name, "change column");
            out.extend(compile_updated_field(name, spec, &table.connection));
        }
    }

    if let Some(deleted) = &table.deleted {
        for (name, column) in deleted {
            trace!(column = name, "drop column");
            out.extend(compile_deleted_field(name, column, &table.connection));
        }
    }

    out
}
