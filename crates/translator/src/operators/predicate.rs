// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Boolean-valued operators: `exists`/`any`, `includes` and the ternary

use std::sync::Arc;

use linq_sql_expr::{MethodCallExpr, Value};
use linq_sql_ir::{CaseExpr, ExistsExpr, InExpr, LikeExpr, Projection, SqlExpression, WhenClause};

use super::scalar::escape_like;
use crate::context::TranslationContext;
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, derived_table, lambda_arg, source_of};

/// Alias of the constant projection inside EXISTS
pub const EXISTS_FLAG: &str = "exists_flag";

/// `exists(pred?)` / `any(pred?)`: `EXISTS (SELECT 1 AS exists_flag FROM ... WHERE ...)`
pub fn translate_exists(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let mut select = visitor.source_select(call, ctx)?;
    if !call.args.is_empty() {
        if select.is_paged() {
            select = derived_table(select)?;
        }
        let predicate = lambda_arg(call, 0)?;
        let binding = visitor.binding_of(&select);
        let condition = visitor.visit_lambda(predicate, vec![binding], ctx)?;
        select.and_where(condition);
    }

    let flag = Projection::new(SqlExpression::constant(1), EXISTS_FLAG)?;
    Ok(SqlExpression::Exists(ExistsExpr {
        select: Box::new(select.with_projection(vec![flag])?),
    }))
}

/// `includes(x)`
///
/// Array membership when either side is a constant array
/// (`[1, 2].includes(u.id)` or `u.id.includes([1, 2])`), substring match
/// when the argument is a constant string.
pub fn translate_includes(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let source = source_of(call)?;
    let argument = &call.args[0];

    let membership = match (source.as_value(), argument.as_value()) {
        (Some(Value::Array(values)), _) => Some((values, argument)),
        (_, Some(Value::Array(values))) => Some((values, source)),
        _ => None,
    };
    if let Some((values, tested)) = membership {
        if values.is_empty() {
            return Err(TranslationError::EmptyInList);
        }
        let expr = visitor.visit(tested, ctx)?;
        return Ok(SqlExpression::In(InExpr::new(expr, values.clone())?));
    }

    match argument.as_value() {
        Some(Value::String(needle)) => {
            let expr = visitor.visit(source, ctx)?;
            Ok(SqlExpression::Like(LikeExpr {
                source: Box::new(expr),
                pattern: format!("%{}%", escape_like(needle)),
            }))
        }
        _ => Err(TranslationError::NonConstantArgument {
            method: call.method.clone(),
            position: 0,
            expected: "a constant array or string".to_string(),
        }),
    }
}

/// `ternary(test, then, else)` → single-branch CASE
pub fn translate_ternary(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let when = visitor.visit(&call.args[0], ctx)?;
    let then = visitor.visit(&call.args[1], ctx)?;
    let otherwise = visitor.visit(&call.args[2], ctx)?;
    Ok(SqlExpression::Case(CaseExpr::new(
        vec![WhenClause { when, then }],
        Some(otherwise),
    )?))
}
