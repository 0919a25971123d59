//! Integration tests for change-set compilation.
//!
//! Each test feeds a JSON change-set through the compiler and checks the
//! statement order, grouping and connection scoping of the result.

mod common;

use common::{compile, compile_err, render_lines, statements};
use oxide_blueprint::prelude::*;

// =============================================================================
// Created tables
// =============================================================================

#[test]
fn created_users_table() {
    let compiled = compile(
        r#"{
            "created": {
                "users": {
                    "connection": "main",
                    "created": {
                        "id": {"type": "increments"},
                        "name": {"type": "string", "typeArgs": [255], "nullable": true}
                    }
                }
            }
        }"#,
    );

    assert_eq!(compiled.passes.len(), 1);
    let pass = &compiled.passes[0];
    assert_eq!(pass.kind, PassKind::CreatedTables);
    assert_eq!(pass.groups.len(), 1);

    let stmts = statements(&pass.groups[0]);
    assert_eq!(stmts.len(), 2);
    match &stmts[1] {
        Statement::Column(expr) => {
            assert_eq!(expr.name(), Some("name"));
            assert_eq!(
                expr.modifiers,
                vec![Modifier::new(
                    "nullable",
                    ModifierArg::Literal(serde_json::Value::Bool(true))
                )]
            );
        }
        other => panic!("Expected Column, got {other:?}"),
    }

    assert_eq!(
        render_lines(&compiled),
        vec![
            "Schema::connection('main')->create('users', function (Blueprint $table) {",
            "$table->increments(\"id\");",
            "$table->string(\"name\", 255)->nullable(true);",
            "});",
        ]
    );
}

#[test]
fn created_tables_get_relationships_only_with_belongs_to() {
    let without = compile(
        r#"{"created": {
            "users": {"connection": "main", "created": {"id": {"type": "increments"}}},
            "teams": {"connection": "main", "created": {"id": {"type": "increments"}}}
        }}"#,
    );
    assert!(without.pass(PassKind::Relationships).is_none());

    let with = compile(
        r#"{"created": {
            "users": {"connection": "main", "created": {"id": {"type": "increments"}}},
            "posts": {"connection": "main", "created": {
                "id": {"type": "increments"},
                "user_id": {"type": "integer", "unsigned": true,
                            "belongsTo": {"foreignKey": "user_id", "model": "User"}}
            }}
        }}"#,
    );
    let pass = with.pass(PassKind::Relationships).unwrap();
    assert_eq!(
        pass.groups,
        vec![
            StatementGroup::Comment("Adding foreign keys".to_string()),
            StatementGroup::AlterTable {
                connection: "main".to_string(),
                table: "posts".to_string(),
                statements: vec![Statement::foreign("user_id", "id", "users")],
            },
        ]
    );
}

#[test]
fn belongs_to_renames_created_column() {
    let compiled = compile(
        r#"{"created": {"memberships": {"connection": "main", "created": {
            "team": {"type": "uuid", "belongsTo": {"foreignKey": "team_uuid", "model": "Team"}}
        }}}}"#,
    );

    let lines = render_lines(&compiled);
    assert!(lines.contains(&"$table->uuid(\"team_uuid\");".to_string()));
    assert!(lines.contains(
        &"$table->foreign('team_uuid')->references('team_uuid')->on('teams');".to_string()
    ));
}

#[test]
fn null_optional_keys_are_absent() {
    let compiled = compile(
        r#"{"created": {"users": {"connection": "main", "created": {
            "name": {"type": "string", "typeArgs": null, "default": null, "belongsTo": null}
        }}}}"#,
    );

    assert!(compiled.pass(PassKind::Relationships).is_none());
    assert_eq!(
        render_lines(&compiled),
        vec![
            "Schema::connection('main')->create('users', function (Blueprint $table) {",
            "$table->string(\"name\");",
            "});",
        ]
    );
}

// =============================================================================
// Updated tables
// =============================================================================

#[test]
fn updated_posts_adds_author() {
    let compiled = compile(
        r#"{"updated": {"posts": {"connection": "main", "created": {
            "author_id": {"type": "integer", "belongsTo": {"foreignKey": "author_id", "model": "User"}}
        }}}}"#,
    );

    assert_eq!(
        render_lines(&compiled),
        vec![
            "Schema::connection('main')->table('posts', function (Blueprint $table) {",
            "$table->integer(\"author_id\");",
            "});",
            "// Adding foreign keys",
            "Schema::connection('main')->table('posts', function (Blueprint $table) {",
            "$table->foreign('author_id')->references('id')->on('users');",
            "});",
        ]
    );
}

#[test]
fn updated_column_with_relation_drops_key_before_change() {
    let compiled = compile(
        r#"{"updated": {"comments": {"connection": "blog", "updated": {
            "body": {"type": "text"},
            "post_id": {"type": "bigInteger", "unsigned": true,
                        "belongsTo": {"foreignKey": "post_id", "model": "Post"}},
            "title": {"type": "string", "typeArgs": [120]}
        }}}}"#,
    );

    let group = &compiled.pass(PassKind::UpdatedTables).unwrap().groups[0];
    let descriptions: Vec<String> = statements(group).iter().map(Statement::description).collect();
    assert_eq!(
        descriptions,
        vec![
            "Change column 'body'",
            "Disable foreign key constraints on 'blog'",
            "Drop foreign key on 'post_id'",
            "Enable foreign key constraints on 'blog'",
            "Change column 'post_id'",
            "Change column 'title'",
        ]
    );
}

#[test]
fn updated_table_bucket_order() {
    let compiled = compile(
        r#"{"updated": {"posts": {"connection": "main",
            "deleted": {"legacy": {}},
            "updated": {"title": {"type": "string", "nullable": false}},
            "created": {"slug": {"type": "string", "unique": true}}
        }}}"#,
    );

    assert_eq!(
        render_lines(&compiled),
        vec![
            "Schema::connection('main')->table('posts', function (Blueprint $table) {",
            "$table->string(\"slug\")->unique(true);",
            "$table->string(\"title\")->nullable(false)->change();",
            "$table->dropColumn('legacy');",
            "});",
        ]
    );
}

#[test]
fn deleted_column_with_relation_drops_key_first() {
    let compiled = compile(
        r#"{"updated": {"posts": {"connection": "main", "deleted": {
            "author_id": {"belongsTo": {"foreignKey": "author_id", "model": "User"}}
        }}}}"#,
    );

    assert_eq!(
        render_lines(&compiled),
        vec![
            "Schema::connection('main')->table('posts', function (Blueprint $table) {",
            "Schema::connection('main')->disableForeignKeyConstraints();",
            "$table->dropForeign(['author_id']);",
            "Schema::connection('main')->enableForeignKeyConstraints();",
            "$table->dropColumn('author_id');",
            "});",
        ]
    );
    assert!(compiled.pass(PassKind::Relationships).is_none());
}

// =============================================================================
// Deleted tables
// =============================================================================

#[test]
fn deleted_comments_is_exactly_the_triplet() {
    let compiled = compile(r#"{"deleted": {"comments": {"connection": "main"}}}"#);

    assert_eq!(compiled.passes.len(), 1);
    assert_eq!(
        compiled.passes[0].groups,
        vec![StatementGroup::Schema(vec![
            SchemaCall::disable_foreign_keys("main"),
            SchemaCall::drop_table("main", "comments"),
            SchemaCall::enable_foreign_keys("main"),
        ])]
    );
}

#[test]
fn each_deleted_table_gets_its_own_triplet() {
    let compiled = compile(
        r#"{"deleted": {
            "comments": {"connection": "main"},
            "audit_log": {"connection": "audit"}
        }}"#,
    );

    assert_eq!(
        compiled.passes[0].groups,
        vec![
            StatementGroup::Schema(vec![
                SchemaCall::disable_foreign_keys("main"),
                SchemaCall::drop_table("main", "comments"),
                SchemaCall::enable_foreign_keys("main"),
            ]),
            StatementGroup::Schema(vec![
                SchemaCall::disable_foreign_keys("audit"),
                SchemaCall::drop_table("audit", "audit_log"),
                SchemaCall::enable_foreign_keys("audit"),
            ]),
        ]
    );
}

// =============================================================================
// Ordering and determinism
// =============================================================================

#[test]
fn tables_keep_document_order() {
    let compiled = compile(
        r#"{"created": {
            "zebras": {"connection": "main", "created": {"id": {"type": "increments"}}},
            "apples": {"connection": "main", "created": {"id": {"type": "increments"}}},
            "mangos": {"connection": "main", "created": {"id": {"type": "increments"}}}
        }}"#,
    );

    let tables: Vec<&str> = compiled.groups().filter_map(StatementGroup::table).collect();
    assert_eq!(tables, vec!["zebras", "apples", "mangos"]);
}

#[test]
fn compiling_twice_is_identical() {
    let json = r#"{
        "created": {"tags": {"connection": "main", "created": {"id": {"type": "increments"}}}},
        "updated": {"posts": {"connection": "main",
            "created": {"tag_id": {"type": "integer", "belongsTo": {"foreignKey": "tag_id", "model": "Post"}}},
            "deleted": {"category": {}}}},
        "deleted": {"categories": {"connection": "main"}}
    }"#;

    let first = compile(json);
    let second = compile(json);
    assert_eq!(first, second);
    assert_eq!(render_lines(&first), render_lines(&second));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn table_in_created_and_updated_is_rejected() {
    let err = compile_err(
        r#"{
            "created": {"users": {"connection": "main", "created": {"id": {"type": "increments"}}}},
            "updated": {"users": {"connection": "main", "created": {"email": {"type": "string"}}}}
        }"#,
    );

    assert!(matches!(
        err,
        BlueprintError::ConflictingTable { ref table, first: Bucket::Created, second: Bucket::Updated }
            if table == "users"
    ));
}

#[test]
fn table_in_updated_and_deleted_is_rejected() {
    let err = compile_err(
        r#"{
            "updated": {"posts": {"connection": "main"}},
            "deleted": {"posts": {"connection": "main"}}
        }"#,
    );
    assert!(matches!(err, BlueprintError::ConflictingTable { .. }));
}

#[test]
fn unknown_related_model_is_a_resolution_error() {
    let err = compile_err(
        r#"{"created": {"invoices": {"connection": "billing", "created": {
            "customer_id": {"type": "integer", "belongsTo": {"foreignKey": "customer_id", "model": "Customer"}}
        }}}}"#,
    );
    assert!(matches!(err, BlueprintError::UnknownModel(ref m) if m == "Customer"));
}

#[test]
fn missing_type_never_reaches_the_compiler() {
    let err = ChangeSet::from_json(
        r#"{"updated": {"posts": {"connection": "main", "updated": {"title": {"nullable": true}}}}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, BlueprintError::MalformedInput(_)));
}

#[test]
fn ambiguous_default_is_rejected() {
    let err = compile_err(
        r#"{"created": {"users": {"connection": "main", "created": {
            "created_at": {"type": "timestamp", "default": "2020-01-01", "rawDefault": "DB::raw('NOW()')"}
        }}}}"#,
    );
    assert!(matches!(err, BlueprintError::AmbiguousDefault { .. }));
}

#[test]
fn columns_on_a_deleted_table_are_malformed() {
    let err = compile_err(
        r#"{"deleted": {"users": {"connection": "main", "created": {
            "a": {"type": "string", "default": "x", "rawDefault": "DB::raw('y')"}
        }}}}"#,
    );
    assert!(matches!(
        err,
        BlueprintError::MalformedInput(ref msg) if msg.contains("deleted table 'users'")
    ));
}
