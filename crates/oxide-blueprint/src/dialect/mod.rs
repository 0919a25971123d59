//! Script rendering.
//!
//! A dialect knows how to print the statement IR in the syntax of one
//! migration runner. The trait's provided methods lay out the script (passes,
//! blank-line separation, nesting); implementors only print single lines.

mod blueprint;

pub use blueprint::BlueprintDialect;

use crate::operations::{ColumnExpr, CompiledChangeSet, SchemaCall, Statement, StatementGroup};
use crate::script::MigrationScript;

/// Accumulates indented script lines.
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    lines: Vec<String>,
    depth: usize,
    indent: &'static str,
}

impl ScriptWriter {
    /// Creates a writer using `indent` for each nesting level.
    #[must_use]
    pub const fn new(indent: &'static str) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent,
        }
    }

    /// Writes a line at the current depth.
    pub fn line(&mut self, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", self.indent.repeat(self.depth), text.as_ref()));
    }

    /// Writes an empty line.
    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Increases the nesting depth.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Decreases the nesting depth.
    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Joins the lines, terminating the output with a newline.
    #[must_use]
    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Trait for migration-runner specific script rendering.
pub trait ScriptDialect: Send + Sync {
    /// Indentation for one nesting level.
    #[must_use]
    fn indent(&self) -> &'static str {
        "    "
    }

    /// Lines before the script entity (imports, file header).
    fn preamble(&self) -> Vec<String>;

    /// Opening line(s) of the script entity; the body is indented one level.
    fn script_open(&self, name: &str) -> Vec<String>;

    /// Closing line(s) of the script entity.
    fn script_close(&self) -> Vec<String>;

    /// Opening line(s) of a procedure (`up` / `down`).
    fn procedure_open(&self, name: &str) -> Vec<String>;

    /// Closing line(s) of a procedure.
    fn procedure_close(&self) -> Vec<String>;

    /// Opening line of a create-table block.
    fn create_table_open(&self, connection: &str, table: &str) -> String;

    /// Opening line of an alter-table block.
    fn alter_table_open(&self, connection: &str, table: &str) -> String;

    /// Closing line of a table block.
    fn table_close(&self) -> String;

    /// Renders a column definition.
    fn column(&self, expr: &ColumnExpr) -> String;

    /// Renders a connection-level call.
    fn schema_call(&self, call: &SchemaCall) -> String;

    /// Renders a statement other than a column definition or schema call.
    fn table_statement(&self, statement: &Statement) -> String;

    /// Renders a comment line.
    fn comment(&self, text: &str) -> String;

    /// Renders any statement inside a table block.
    #[must_use]
    fn statement(&self, statement: &Statement) -> String {
        match statement {
            Statement::Column(expr) => self.column(expr),
            Statement::Schema(call) => self.schema_call(call),
            other => self.table_statement(other),
        }
    }

    /// Writes one statement group.
    fn write_group(&self, out: &mut ScriptWriter, group: &StatementGroup) {
        match group {
            StatementGroup::CreateTable {
                connection,
                table,
                statements,
            } => {
                out.line(self.create_table_open(connection, table));
                self.write_block_body(out, statements);
            }
            StatementGroup::AlterTable {
                connection,
                table,
                statements,
            } => {
                out.line(self.alter_table_open(connection, table));
                self.write_block_body(out, statements);
            }
            StatementGroup::Schema(calls) => {
                for call in calls {
                    out.line(self.schema_call(call));
                }
            }
            StatementGroup::Comment(text) => out.line(self.comment(text)),
        }
    }

    /// Writes the statements of a table block and closes it.
    fn write_block_body(&self, out: &mut ScriptWriter, statements: &[Statement]) {
        out.indent();
        for statement in statements {
            out.line(self.statement(statement));
        }
        out.dedent();
        out.line(self.table_close());
    }

    /// Writes a compiled change-set: passes separated by a blank line, groups
    /// separated by a blank line where the pass asks for it.
    fn write_compiled(&self, out: &mut ScriptWriter, compiled: &CompiledChangeSet) {
        for (i, pass) in compiled.passes.iter().enumerate() {
            if i > 0 {
                out.blank();
            }
            for (j, group) in pass.groups.iter().enumerate() {
                if j > 0 && pass.kind.separates_groups() {
                    out.blank();
                }
                self.write_group(out, group);
            }
        }
    }

    /// Writes a procedure wrapping a compiled change-set.
    fn write_procedure(&self, out: &mut ScriptWriter, name: &str, body: &CompiledChangeSet) {
        for line in self.procedure_open(name) {
            out.line(line);
        }
        out.indent();
        self.write_compiled(out, body);
        out.dedent();
        for line in self.procedure_close() {
            out.line(line);
        }
    }

    /// Renders a whole migration script.
    #[must_use]
    fn render_script(&self, script: &MigrationScript) -> String {
        let mut out = ScriptWriter::new(self.indent());

        for line in self.preamble() {
            if line.is_empty() {
                out.blank();
            } else {
                out.line(line);
            }
        }
        for line in self.script_open(script.name()) {
            out.line(line);
        }
        out.indent();
        self.write_procedure(&mut out, "up", script.up());
        out.blank();
        self.write_procedure(&mut out, "down", script.down());
        out.dedent();
        for line in self.script_close() {
            out.line(line);
        }

        out.finish()
    }
}
