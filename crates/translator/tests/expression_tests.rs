// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Scalar methods, membership tests, error reporting and registry extension

use std::sync::Arc;

use linq_sql_expr::builder::{constant, lambda, lit, param, table};
use linq_sql_expr::{MethodCallExpr, Value};
use linq_sql_ir::SqlExpression;
use linq_sql_test_utils::{Queryable, SqlAssertions, posts, users};
use linq_sql_translator::{
    ErrorKind, OperatorRegistry, QueryTranslator, QueryVisitor, TranslationContext,
    TranslationError, TranslationResult, TranslatorConfig, translate,
};

fn predicate_of(sql: &SqlExpression) -> String {
    SqlAssertions::expect_select(sql)
        .predicate
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[test]
fn test_includes_constant_array() {
    let sql = users().where_("u => [1, 2, 3].includes(u.id)").translate().unwrap();
    assert_eq!(predicate_of(&sql), "u.id IN (1, 2, 3)");

    let select = SqlAssertions::expect_select(&sql);
    match select.predicate.as_ref() {
        Some(SqlExpression::In(in_expr)) => {
            assert_eq!(
                in_expr.values(),
                &[Value::Integer(1), Value::Integer(2), Value::Integer(3)]
            );
        }
        other => panic!("Expected In, found {:?}", other),
    }
}

#[test]
fn test_includes_array_argument() {
    let sql = users().where_("u => u.dept.includes(['ops', 'dev'])").translate().unwrap();
    assert_eq!(predicate_of(&sql), "u.dept IN ('ops', 'dev')");
}

#[test]
fn test_includes_scoped_array() {
    let ids = Value::Array(vec![Value::Integer(7), Value::Integer(9)]);
    let sql = users()
        .with_scope([("ids", constant(ids))])
        .where_("u => ids.includes(u.id)")
        .translate()
        .unwrap();
    assert_eq!(predicate_of(&sql), "u.id IN (7, 9)");
}

#[test]
fn test_includes_empty_array_fails() {
    let err = users().where_("u => [].includes(u.id)").translate().unwrap_err();
    assert_eq!(err, TranslationError::EmptyInList);
    assert_eq!(err.kind(), ErrorKind::Translation);
}

#[test]
fn test_includes_substring() {
    let sql = users().where_("u => u.name.includes('a_b')").translate().unwrap();
    assert_eq!(predicate_of(&sql), "u.name LIKE '%a[_]b%'");
}

#[test]
fn test_includes_requires_constant() {
    let err = users().where_("u => u.name.includes(u.email)").translate().unwrap_err();
    assert!(matches!(err, TranslationError::NonConstantArgument { position: 0, .. }));
}

#[test]
fn test_like_patterns_are_escaped() {
    let starts = users().where_("u => u.name.startsWith('x%_')").translate().unwrap();
    assert_eq!(predicate_of(&starts), "u.name LIKE 'x[%][_]%'");

    let ends = users().where_("u => u.email.endsWith('@[corp]')").translate().unwrap();
    assert_eq!(predicate_of(&ends), "u.email LIKE '%@[[]corp]'");
}

#[test]
fn test_string_functions() {
    let sql = users()
        .select("u => ({ upper: u.name.toUpperCase(), lower: u.name.toLowerCase(), clean: u.name.trim() })")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT UPPER(u.name) AS upper, LOWER(u.name) AS lower, TRIM(u.name) AS clean FROM Users AS u",
    );
}

#[test]
fn test_substring_indices() {
    let sql = users()
        .select(
            "u => ({ initial: u.name.substring(0, 1), rest: u.name.substring(2), swapped: u.name.substring(5, 2) })",
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT SUBSTRING(u.name, 1, 1) AS initial, SUBSTRING(u.name, 3, LEN(u.name)) AS rest, \
         SUBSTRING(u.name, 3, 3) AS swapped FROM Users AS u",
    );
}

#[test]
fn test_date_parts() {
    let sql = users()
        .select("u => ({ year: u.createdAt.getFullYear(), month: u.createdAt.getMonth(), day: u.createdAt.getDate() })")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT YEAR(u.createdAt) AS year, (MONTH(u.createdAt) - 1) AS month, \
         DAY(u.createdAt) AS day FROM Users AS u",
    );
}

#[test]
fn test_scalar_members() {
    let sql = users()
        .where_("u => u.name.length > 3 && u.createdAt.year == 2024")
        .translate()
        .unwrap();
    assert_eq!(
        predicate_of(&sql),
        "((LEN(u.name) > 3) AND (YEAR(u.createdAt) = 2024))"
    );

    // Column names that match a date part stay columns
    let sql = users().select("u => u.year").translate().unwrap();
    SqlAssertions::assert_text(&sql, "SELECT u.year AS year FROM Users AS u");
}

#[test]
fn test_unsupported_method() {
    let err = users().where_("u => u.name.padStart(3) == 'x'").translate().unwrap_err();
    assert_eq!(
        err,
        TranslationError::UnsupportedMethod {
            method: "padStart".to_string()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Translation);
}

#[test]
fn test_argument_count_is_checked() {
    let err = users().select("u => u.name.substring()").translate().unwrap_err();
    assert_eq!(
        err,
        TranslationError::ArgumentCount {
            method: "substring".to_string(),
            expected: "1 to 2".to_string(),
            found: 0,
        }
    );
}

#[test]
fn test_unresolved_identifier_is_resolution_error() {
    let err = users().where_("u => other.id == u.id").translate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert!(err.to_string().contains("other"));
}

#[test]
fn test_unbound_parameter() {
    let u = param("u");
    let stray = param("v");
    let query = table("Users").call(
        "where",
        vec![lambda([u], stray.to_expr().member("id").equal(lit(1)))],
    );

    let err = translate(&query).unwrap_err();
    assert_eq!(
        err,
        TranslationError::UnboundParameter {
            name: "v".to_string(),
            bound: vec!["u".to_string()],
        }
    );
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_parse_error_kind() {
    let err = users().where_("u => u['age'] > 3").translate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_group_member_must_exist() {
    let err = users()
        .group_by("u => u.dept", Some("g => ({ x: g.missing })"))
        .translate()
        .unwrap_err();
    assert!(matches!(err, TranslationError::Unsupported { .. }));
}

#[test]
fn test_recursion_limit() {
    let translator = QueryTranslator::with_config(TranslatorConfig::default().with_max_depth(4));
    let query = users()
        .where_("u => u.a == 1 && u.b == 2 && u.c == 3 && u.d == 4");
    let err = query.translate_with(&translator).unwrap_err();
    assert!(matches!(err, TranslationError::RecursionLimitExceeded { limit: 4, .. }));
    assert!(query.translate().is_ok());
}

#[test]
fn test_json_flag_follows_config() {
    let translator =
        QueryTranslator::with_config(TranslatorConfig::default().with_json_include_nulls(false));
    let sql = users()
        .with_scope([("posts", posts().build().unwrap())])
        .select("u => ({ posts: posts.where(p => p.authorId == u.id) })")
        .translate_with(&translator)
        .unwrap();
    assert!(!sql.to_string().contains("INCLUDE_NULL_VALUES"));
}

fn translate_as_is(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    _ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let source = linq_sql_translator::visitor::source_of(call)?;
    visitor.visit(source, &TranslationContext::root())
}

#[test]
fn test_custom_registry() {
    let mut registry = OperatorRegistry::standard();
    registry.register("asIs", 0..=0, translate_as_is);
    let translator = QueryTranslator::new().with_registry(registry);

    let query = Queryable::from_expression(table("Users").call("asIs", vec![]));
    let sql = query.translate_with(&translator).unwrap();
    SqlAssertions::assert_text(&sql, "Users AS u");

    assert_eq!(
        query.translate().unwrap_err(),
        TranslationError::UnsupportedMethod {
            method: "asIs".to_string()
        }
    );
}
