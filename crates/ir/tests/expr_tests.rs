// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Unit tests for scalar SQL expression nodes

use linq_sql_ir::{
    CaseExpr, ColumnExpr, InExpr, LikeExpr, SqlExpression, SqlOperator, StructuralError,
    TableExpr, ToMetadata, Value, WhenClause,
};

fn users() -> TableExpr {
    TableExpr::new("Users", "u").unwrap()
}

fn column(name: &str) -> SqlExpression {
    SqlExpression::Column(ColumnExpr::new(name, users()).unwrap())
}

#[test]
fn test_column_requires_name() {
    let err = ColumnExpr::new("", users()).unwrap_err();
    assert_eq!(
        err,
        StructuralError::EmptyName {
            node: "Column".to_string()
        }
    );
}

#[test]
fn test_column_keeps_owning_table() {
    let col = ColumnExpr::new("id", users()).unwrap();
    assert_eq!(col.table().name(), "Users");
    assert_eq!(col.table().alias(), "u");
    assert!(!col.is_star());
    assert!(ColumnExpr::star(users()).is_star());
}

#[test]
fn test_in_rejects_empty_list() {
    let err = InExpr::new(column("id"), vec![]).unwrap_err();
    assert_eq!(err, StructuralError::EmptyInList);

    let ok = InExpr::new(column("id"), vec![Value::Integer(1), Value::Integer(2)]).unwrap();
    assert_eq!(ok.values().len(), 2);
    assert_eq!(SqlExpression::In(ok).to_string(), "u.id IN (1, 2)");
}

#[test]
fn test_case_requires_clause() {
    assert_eq!(CaseExpr::new(vec![], None).unwrap_err(), StructuralError::EmptyCase);

    let case = CaseExpr::new(
        vec![WhenClause {
            when: SqlExpression::binary(
                column("age"),
                SqlOperator::GreaterThan,
                SqlExpression::constant(17),
            ),
            then: SqlExpression::constant("adult"),
        }],
        Some(SqlExpression::constant("minor")),
    )
    .unwrap();
    assert_eq!(
        SqlExpression::Case(case).to_string(),
        "CASE WHEN (u.age > 17) THEN 'adult' ELSE 'minor' END"
    );
}

#[test]
fn test_like_debug_text() {
    let like = SqlExpression::Like(LikeExpr {
        source: Box::new(column("name")),
        pattern: "A%".to_string(),
    });
    assert_eq!(like.to_string(), "u.name LIKE 'A%'");
    assert_eq!(like.kind(), "Like");
}

#[test]
fn test_function_call_metadata() {
    let f = SqlExpression::function("UPPER", vec![column("name")]);
    let meta = f.to_metadata();
    assert_eq!(meta["type"], "FunctionCall");
    assert_eq!(meta["name"], "UPPER");
    assert_eq!(meta["args"][0]["type"], "Column");
    assert_eq!(f.to_string(), "UPPER(u.name)");
}

#[test]
fn test_metadata_is_deterministic() {
    let build = || {
        SqlExpression::binary(
            column("age"),
            SqlOperator::GreaterThan,
            SqlExpression::constant(30),
        )
        .to_metadata()
    };
    assert_eq!(build(), build());
    assert_eq!(
        serde_json::to_string(&build()).unwrap(),
        serde_json::to_string(&build()).unwrap()
    );
}
