#![allow(dead_code)]

use oxide_blueprint::prelude::*;

pub fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .entity("User", EntityInfo::new("users", "id"))
        .entity("Post", EntityInfo::new("posts", "id"))
        .entity("Team", EntityInfo::new("teams", "team_uuid"))
}

pub fn change_set(json: &str) -> ChangeSet {
    ChangeSet::from_json(json).unwrap_or_else(|e| panic!("Failed to parse: {json}\nError: {e:?}"))
}

pub fn compile(json: &str) -> CompiledChangeSet {
    let registry = registry();
    StatementCompiler::new(&registry)
        .compile(&change_set(json))
        .unwrap_or_else(|e| panic!("Failed to compile: {json}\nError: {e:?}"))
}

pub fn compile_err(json: &str) -> BlueprintError {
    let registry = registry();
    match StatementCompiler::new(&registry).compile(&change_set(json)) {
        Ok(compiled) => panic!("Expected compile error for: {json}\nGot: {compiled:?}"),
        Err(err) => err,
    }
}

/// Renders every statement of a compiled change-set, one line each, without
/// the surrounding script.
pub fn render_lines(compiled: &CompiledChangeSet) -> Vec<String> {
    let dialect = BlueprintDialect::new();
    let mut lines = Vec::new();
    for group in compiled.groups() {
        match group {
            StatementGroup::CreateTable {
                connection,
                table,
                statements,
            } => {
                lines.push(dialect.create_table_open(connection, table));
                lines.extend(statements.iter().map(|s| dialect.statement(s)));
                lines.push(dialect.table_close());
            }
            StatementGroup::AlterTable {
                connection,
                table,
                statements,
            } => {
                lines.push(dialect.alter_table_open(connection, table));
                lines.extend(statements.iter().map(|s| dialect.statement(s)));
                lines.push(dialect.table_close());
            }
            StatementGroup::Schema(calls) => {
                lines.extend(calls.iter().map(|c| dialect.schema_call(c)));
            }
            StatementGroup::Comment(text) => lines.push(dialect.comment(text)),
        }
    }
    lines
}

pub fn statements(group: &StatementGroup) -> &[Statement] {
    match group {
        StatementGroup::CreateTable { statements, .. }
        | StatementGroup::AlterTable { statements, .. } => statements,
        other => panic!("Expected a table block, got {other:?}"),
    }
}
