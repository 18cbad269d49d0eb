// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `count`, `sum`, `avg`, `min`, `max`
//!
//! On a query source an aggregate builds a new select over the source's
//! FROM, joins, WHERE and GROUP BY with a single aggregate projection. The
//! source's projection does not survive, but selectors still see its
//! projected names (`select(u => ({ a: u.age })).sum(x => x.a)` sums
//! `u.age`). A paged source is aggregated as a derived table. Inside a
//! lambda body that select becomes a scalar subquery.
//!
//! On a group placeholder an aggregate is a plain function call evaluated
//! per group.

use std::sync::Arc;

use linq_sql_expr::MethodCallExpr;
use linq_sql_ir::{CaseExpr, Projection, SelectExpr, SqlExpression, WhenClause};

use super::scalar_result;
use crate::context::{Binding, GroupBinding, TranslationContext};
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, lambda_arg, source_of};

/// Alias suffix of an aggregate projection (`sum_result`)
pub const RESULT_SUFFIX: &str = "_result";

fn function_name(method: &str) -> Option<&'static str> {
    match method {
        "count" => Some("COUNT"),
        "sum" => Some("SUM"),
        "avg" => Some("AVG"),
        "min" => Some("MIN"),
        "max" => Some("MAX"),
        _ => None,
    }
}

pub fn translate_aggregate(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let function = function_name(&call.method).ok_or_else(|| TranslationError::UnsupportedMethod {
        method: call.method.clone(),
    })?;

    if let Some(group) = visitor.group_of(source_of(call)?, ctx) {
        return group_aggregate(visitor, call, function, &group, ctx);
    }

    let source = visitor.unpaged_source(call, ctx)?;
    let binding = visitor.binding_of(&source);
    let mut condition = None;
    let value = if call.method == "count" {
        if !call.args.is_empty() {
            let predicate = lambda_arg(call, 0)?;
            condition = Some(visitor.visit_lambda(predicate, vec![binding], ctx)?);
        }
        SqlExpression::constant(1)
    } else if call.args.is_empty() {
        sole_value(&source, &call.method)?
    } else {
        let selector = lambda_arg(call, 0)?;
        visitor.visit_lambda(selector, vec![binding], ctx)?
    };

    let projection = Projection::new(
        SqlExpression::function(function, vec![value]),
        format!("{}{}", call.method, RESULT_SUFFIX),
    )?;
    let mut select = SelectExpr::new(source.alias(), vec![projection], source.from().clone())?;
    select.joins = source.joins;
    select.predicate = source.predicate;
    select.group_by = source.group_by;
    select.having = source.having;
    if let Some(condition) = condition {
        select.and_where(condition);
    }

    Ok(scalar_result(select, ctx))
}

/// Aggregate over the rows of one group
fn group_aggregate(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    function: &str,
    group: &GroupBinding,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let row = || vec![Binding::Source(group.row_source().clone())];

    let value = match (call.method.as_str(), call.args.is_empty()) {
        ("count", true) => SqlExpression::constant(1),
        ("count", false) => {
            let predicate = lambda_arg(call, 0)?;
            let condition = visitor.visit_lambda(predicate, row(), ctx)?;
            let when = WhenClause {
                when: condition,
                then: SqlExpression::constant(1),
            };
            SqlExpression::Case(CaseExpr::new(vec![when], None)?)
        }
        (_, true) => return Err(TranslationError::missing(&call.method, "selector")),
        (_, false) => {
            let selector = lambda_arg(call, 0)?;
            visitor.visit_lambda(selector, row(), ctx)?
        }
    };
    Ok(SqlExpression::function(function, vec![value]))
}

/// The single non-star projection of `source`, aggregated when no selector
/// is given (`users.select(u => u.age).max()`)
fn sole_value(source: &SelectExpr, method: &str) -> TranslationResult<SqlExpression> {
    let mut values = source
        .projection()
        .iter()
        .filter(|p| p.star_column().is_none());
    match (values.next(), values.next()) {
        (Some(only), None) => Ok(only.expr().clone()),
        _ => Err(TranslationError::missing(method, "selector")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names() {
        assert_eq!(function_name("avg"), Some("AVG"));
        assert_eq!(function_name("median"), None);
    }
}
