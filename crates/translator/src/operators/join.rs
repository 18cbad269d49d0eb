// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `join` / `leftJoin`
//!
//! ```text
//! users.join(posts, u => u.id, p => p.authorId, (u, p) => ({ name: u.name, title: p.title }))
//!
//! SELECT u.name AS name, p.title AS title
//! FROM Users AS u INNER JOIN Posts AS p ON u.id = p.authorId
//! ```

use std::sync::Arc;

use linq_sql_expr::{Expression, LambdaExpr, MethodCallExpr};
use linq_sql_ir::{
    ColumnExpr, JoinExpr, JoinKind, Projection, SqlExpression, SqlOperator, TableExpr,
    WHOLE_ROW_SUFFIX,
};

use super::build_projections;
use crate::context::{Binding, TranslationContext};
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, bind_lambda, binary_expression, lambda_arg};

pub fn translate_join(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let mut outer = visitor.unpaged_source(call, ctx)?;
    let outer_binding = visitor.binding_of(&outer);

    let inner = visitor.visit(&call.args[0], ctx)?;
    let (target, inner_table) = join_target(visitor, inner)?;
    let inner_binding = Binding::Source(SqlExpression::Table(inner_table.clone()));

    let outer_keys = key_terms(visitor, lambda_arg(call, 1)?, outer_binding.clone(), ctx)?;
    let inner_keys = key_terms(visitor, lambda_arg(call, 2)?, inner_binding.clone(), ctx)?;
    let predicate = key_predicate(outer_keys, inner_keys)?;

    let kind = if call.method == "leftJoin" {
        JoinKind::Left
    } else {
        JoinKind::Inner
    };
    outer.joins.push(JoinExpr::new(kind, target, predicate)?);

    let projection = match call.args.get(3) {
        Some(_) => {
            let selector = lambda_arg(call, 3)?;
            let bound = bind_lambda(selector, vec![outer_binding, inner_binding], ctx)?;
            build_projections(visitor, &selector.body, &bound, &outer)?
        }
        None => {
            let mut projection = outer.projection().to_vec();
            let alias = format!("{}{}", inner_table.alias(), WHOLE_ROW_SUFFIX);
            projection.push(Projection::star(ColumnExpr::star(inner_table), alias)?);
            projection
        }
    };
    Ok(SqlExpression::Select(Box::new(outer.with_projection(projection)?)))
}

/// JOIN target plus the table its rows are addressed through
///
/// Derived selects and unions are addressed by their alias.
fn join_target(
    visitor: &mut QueryVisitor<'_>,
    inner: SqlExpression,
) -> TranslationResult<(SqlExpression, TableExpr)> {
    match inner {
        SqlExpression::Table(table) => Ok((SqlExpression::Table(table.clone()), table)),
        SqlExpression::Select(select) => {
            let table = TableExpr::new(select.alias(), select.alias())?;
            Ok((SqlExpression::Select(select), table))
        }
        SqlExpression::Union(mut union) => {
            let alias = visitor.union_alias(&mut union)?;
            let table = TableExpr::new(alias.clone(), alias)?;
            Ok((SqlExpression::Union(union), table))
        }
        other => Err(TranslationError::unsupported(format!(
            "cannot join {}",
            other.kind()
        ))),
    }
}

/// Translated key terms; an object literal gives one term per property
fn key_terms(
    visitor: &mut QueryVisitor<'_>,
    selector: &LambdaExpr,
    binding: Binding,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<Vec<SqlExpression>> {
    let bound = bind_lambda(selector, vec![binding], ctx)?;
    match selector.body.as_ref() {
        Expression::NewObject(object) => object
            .properties
            .values()
            .map(|value| visitor.visit(value, &bound))
            .collect(),
        body => Ok(vec![visitor.visit(body, &bound)?]),
    }
}

fn key_predicate(
    outer: Vec<SqlExpression>,
    inner: Vec<SqlExpression>,
) -> TranslationResult<SqlExpression> {
    if outer.len() != inner.len() {
        return Err(TranslationError::unsupported(format!(
            "join keys differ in size: {} outer, {} inner",
            outer.len(),
            inner.len()
        )));
    }
    outer
        .into_iter()
        .zip(inner)
        .map(|(o, i)| binary_expression(o, SqlOperator::Equal, i))
        .reduce(|acc, next| SqlExpression::binary(acc, SqlOperator::And, next))
        .ok_or_else(|| TranslationError::missing("join", "key"))
}
