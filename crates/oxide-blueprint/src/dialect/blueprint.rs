//! Laravel schema-builder dialect.
//!
//! Renders statements as calls on the `Schema` facade and the `Blueprint`
//! table builder, inside a `Migration` class with `up()` and `down()`.

use serde_json::Value;

use crate::operations::{ColumnExpr, ModifierArg, SchemaCall, Statement};

use super::ScriptDialect;

/// Schema-builder (`Schema` / `Blueprint`) migration dialect.
#[derive(Debug, Clone, Default)]
pub struct BlueprintDialect;

impl BlueprintDialect {
    /// Creates a new blueprint dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Quotes a name as a single-quoted string literal.
fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Encodes literal data as JSON.
fn literal(value: &Value) -> String {
    value.to_string()
}

fn connection(name: &str) -> String {
    format!("Schema::connection({})", quote(name))
}

fn modifier_arg(arg: &ModifierArg) -> String {
    match arg {
        ModifierArg::None => String::new(),
        ModifierArg::Literal(value) => literal(value),
        ModifierArg::Raw(expr) => expr.clone(),
    }
}

fn table_open(method: &str, conn: &str, table: &str) -> String {
    format!(
        "{}->{method}({}, function (Blueprint $table) {{",
        connection(conn),
        quote(table)
    )
}

impl ScriptDialect for BlueprintDialect {
    fn preamble(&self) -> Vec<String> {
        vec![
            "<?php".to_string(),
            String::new(),
            "use Illuminate\\Support\\Facades\\Schema;".to_string(),
            "use Illuminate\\Database\\Schema\\Blueprint;".to_string(),
            "use Illuminate\\Database\\Migrations\\Migration;".to_string(),
            String::new(),
        ]
    }

    fn script_open(&self, name: &str) -> Vec<String> {
        vec![format!("class {name} extends Migration"), "{".to_string()]
    }

    fn script_close(&self) -> Vec<String> {
        vec!["}".to_string()]
    }

    fn procedure_open(&self, name: &str) -> Vec<String> {
        vec![format!("public function {name}()"), "{".to_string()]
    }

    fn procedure_close(&self) -> Vec<String> {
        vec!["}".to_string()]
    }

    fn create_table_open(&self, connection: &str, table: &str) -> String {
        table_open("create", connection, table)
    }

    fn alter_table_open(&self, connection: &str, table: &str) -> String {
        table_open("table", connection, table)
    }

    fn table_close(&self) -> String {
        "});".to_string()
    }

    fn column(&self, expr: &ColumnExpr) -> String {
        let args: Vec<String> = expr.args.iter().map(literal).collect();
        let mut out = format!("$table->{}({})", expr.column_type, args.join(", "));

        for modifier in &expr.modifiers {
            out.push_str("->");
            out.push_str(&modifier.method);
            out.push('(');
            out.push_str(&modifier_arg(&modifier.arg));
            out.push(')');
        }
        if expr.change {
            out.push_str("->change()");
        }
        out.push(';');
        out
    }

    fn schema_call(&self, call: &SchemaCall) -> String {
        match call {
            SchemaCall::DisableForeignKeyConstraints { connection: conn } => {
                format!("{}->disableForeignKeyConstraints();", connection(conn))
            }
            SchemaCall::EnableForeignKeyConstraints { connection: conn } => {
                format!("{}->enableForeignKeyConstraints();", connection(conn))
            }
            SchemaCall::DropTable {
                connection: conn,
                table,
            } => format!("{}->drop({});", connection(conn), quote(table)),
        }
    }

    fn table_statement(&self, statement: &Statement) -> String {
        match statement {
            Statement::DropColumn { name } => {
                format!("$table->dropColumn({});", quote(name))
            }
            Statement::DropForeign { columns } => {
                let quoted: Vec<String> = columns.iter().map(|c| quote(c)).collect();
                format!("$table->dropForeign([{}]);", quoted.join(", "))
            }
            Statement::Foreign {
                column,
                references,
                on,
            } => format!(
                "$table->foreign({})->references({})->on({});",
                quote(column),
                quote(references),
                quote(on)
            ),
            Statement::Column(expr) => self.column(expr),
            Statement::Schema(call) => self.schema_call(call),
        }
    }

    fn comment(&self, text: &str) -> String {
        format!("// {text}")
    }
}
