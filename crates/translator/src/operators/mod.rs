// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Operator rules
//!
//! One module per operator family. Every handler has the
//! [`OperatorHandler`](crate::registry::OperatorHandler) signature and either
//! extends the select produced by its receiver or builds a new node around
//! it. Argument counts are checked by the registry before a handler runs.
//!
//! Projection building is shared by `select`, `join` and `groupBy` and
//! lives here.

pub mod aggregate;
pub mod group;
pub mod join;
pub mod predicate;
pub mod query;
pub mod scalar;
pub mod set;

use std::sync::Arc;

use linq_sql_expr::{Expression, MethodCallExpr, Value};
use linq_sql_ir::{
    ColumnExpr, JsonFlags, JsonMode, Projection, STAR, ScalarSubqueryAsJsonExpr, ScalarSubqueryExpr,
    SelectExpr, SqlExpression, WHOLE_ROW_SUFFIX,
};

use crate::context::TranslationContext;
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::QueryVisitor;

/// Alias of a projection with no natural name
pub const VALUE_ALIAS: &str = "value";

/// Projection list for a selector body
///
/// An object literal yields one projection per property, a member access a
/// single projection named after the member. A bare parameter standing for
/// the current row keeps the current projection list.
pub fn build_projections(
    visitor: &mut QueryVisitor<'_>,
    body: &Expression,
    ctx: &Arc<TranslationContext>,
    current: &SelectExpr,
) -> TranslationResult<Vec<Projection>> {
    match body {
        Expression::NewObject(object) => {
            let mut projections = Vec::with_capacity(object.properties.len());
            for (name, value) in &object.properties {
                let sql = visitor.visit(value, ctx)?;
                projections.push(project(visitor, name, sql, current)?);
            }
            Ok(projections)
        }
        Expression::MemberAccess(access) => {
            let sql = visitor.visit(body, ctx)?;
            Ok(vec![project(visitor, &access.member, sql, current)?])
        }
        Expression::Parameter(parameter) => match visitor.visit(body, ctx)? {
            SqlExpression::Select(select) if select.alias() == current.alias() => {
                Ok(current.projection().to_vec())
            }
            SqlExpression::Table(table) => {
                Ok(vec![Projection::star(ColumnExpr::star(table), STAR)?])
            }
            sql => Ok(vec![project(visitor, parameter.name(), sql, current)?]),
        },
        _ => {
            let sql = visitor.visit(body, ctx)?;
            Ok(vec![project(visitor, VALUE_ALIAS, sql, current)?])
        }
    }
}

/// One named projection of a translated value
///
/// Whole rows flatten to `<name>_all` star projections; foreign queries
/// become JSON subqueries; scalars project as they are.
pub fn project(
    visitor: &mut QueryVisitor<'_>,
    name: &str,
    sql: SqlExpression,
    current: &SelectExpr,
) -> TranslationResult<Projection> {
    let whole_row = format!("{}{}", name, WHOLE_ROW_SUFFIX);
    match sql {
        SqlExpression::Table(table) => Ok(Projection::star(ColumnExpr::star(table), whole_row)?),
        SqlExpression::Select(select) if select.alias() == current.alias() => {
            let stars: Vec<&ColumnExpr> = select.star_projections().collect();
            match stars.as_slice() {
                [star] => Ok(Projection::star((*star).clone(), whole_row)?),
                _ => Err(TranslationError::unsupported(format!(
                    "projecting the current row as '{}' needs exactly one star projection",
                    name
                ))),
            }
        }
        sql @ (SqlExpression::Select(_) | SqlExpression::Union(_)) => {
            let select = visitor.as_select(sql)?;
            let json = json_subquery(visitor, select, false);
            Ok(Projection::new(json, name)?)
        }
        scalar => Ok(Projection::new(scalar, name)?),
    }
}

/// Select rendered as a JSON value inside an outer row
pub fn json_subquery(
    visitor: &QueryVisitor<'_>,
    select: SelectExpr,
    without_array_wrapper: bool,
) -> SqlExpression {
    SqlExpression::ScalarSubqueryAsJson(ScalarSubqueryAsJsonExpr {
        select: Box::new(select),
        mode: JsonMode::Path,
        flags: JsonFlags {
            include_null_values: visitor.config().json_include_nulls,
            without_array_wrapper,
        },
    })
}

/// Constant value of argument `index`
pub fn constant_arg<'c>(
    call: &'c MethodCallExpr,
    index: usize,
    expected: &str,
) -> TranslationResult<&'c Value> {
    call.args
        .get(index)
        .and_then(Expression::as_value)
        .ok_or_else(|| TranslationError::NonConstantArgument {
            method: call.method.clone(),
            position: index,
            expected: expected.to_string(),
        })
}

/// Argument `index` as a constant non-negative integer
pub fn count_arg(call: &MethodCallExpr, index: usize) -> TranslationResult<u64> {
    const EXPECTED: &str = "a non-negative integer constant";
    let value = constant_arg(call, index, EXPECTED)?;
    value
        .as_i64()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| TranslationError::NonConstantArgument {
            method: call.method.clone(),
            position: index,
            expected: EXPECTED.to_string(),
        })
}

/// Wrap an aggregate select the way its position requires
pub fn scalar_result(select: SelectExpr, ctx: &TranslationContext) -> SqlExpression {
    if ctx.is_nested() {
        SqlExpression::ScalarSubquery(ScalarSubqueryExpr {
            select: Box::new(select),
        })
    } else {
        SqlExpression::Select(Box::new(select))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linq_sql_expr::builder::{lit, param};

    fn call(method: &str, args: Vec<Expression>) -> MethodCallExpr {
        MethodCallExpr {
            method: method.to_string(),
            source: None,
            args,
        }
    }

    #[test]
    fn test_count_arg() {
        assert_eq!(count_arg(&call("take", vec![lit(5)]), 0).unwrap(), 5);
        assert!(matches!(
            count_arg(&call("take", vec![lit(-1)]), 0),
            Err(TranslationError::NonConstantArgument { position: 0, .. })
        ));
        assert!(count_arg(&call("take", vec![lit(1.5)]), 0).is_err());
        assert!(count_arg(&call("take", vec![param("n").to_expr()]), 0).is_err());
    }
}
