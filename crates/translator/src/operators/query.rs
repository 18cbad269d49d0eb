// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Filtering, projection, ordering and paging

use std::sync::Arc;

use linq_sql_expr::MethodCallExpr;
use linq_sql_ir::{OrderByExpr, SortDirection, SqlExpression};
use tracing::warn;

use super::{build_projections, count_arg, json_subquery};
use crate::context::TranslationContext;
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, bind_lambda, derived_table, lambda_arg};

/// `where(pred)`: AND onto WHERE, or onto HAVING for a grouped select
pub fn translate_where(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let mut select = visitor.unpaged_source(call, ctx)?;
    let predicate = lambda_arg(call, 0)?;
    let binding = visitor.binding_of(&select);
    let condition = visitor.visit_lambda(predicate, vec![binding], ctx)?;

    if select.is_grouped() {
        select.and_having(condition);
    } else {
        select.and_where(condition);
    }
    Ok(SqlExpression::Select(Box::new(select)))
}

/// `select(sel)`: replace the projection list
pub fn translate_select(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let select = visitor.source_select(call, ctx)?;
    let selector = lambda_arg(call, 0)?;

    let inner = bind_lambda(selector, vec![visitor.binding_of(&select)], ctx)?;
    let projection = build_projections(visitor, &selector.body, &inner, &select)?;
    Ok(SqlExpression::Select(Box::new(select.with_projection(projection)?)))
}

/// `orderBy`, `thenBy` and their descending forms
pub fn translate_order_by(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let mut select = visitor.unpaged_source(call, ctx)?;
    let key = lambda_arg(call, 0)?;
    let binding = visitor.binding_of(&select);
    let expr = visitor.visit_lambda(key, vec![binding], ctx)?;

    let direction = if call.method.ends_with("Descending") {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    select.order_by.push(OrderByExpr { expr, direction });
    Ok(SqlExpression::Select(Box::new(select)))
}

/// `skip(n)` / `take(n)`
///
/// A `take` after `skip` shares one select (`OFFSET n LIMIT m`). Any other
/// paging over an already paged select pages a derived table, so
/// `take(5).skip(2)` yields rows 3 to 5.
pub fn translate_paging(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let count = count_arg(call, 0)?;
    let select = visitor.source_select(call, ctx)?;
    let skip = call.method == "skip";

    // A paged source was checked for ordering when it was paged
    if select.order_by.is_empty() && !select.is_paged() {
        if visitor.config().require_order_for_paging {
            return Err(TranslationError::PagingWithoutOrdering {
                method: call.method.clone(),
            });
        }
        warn!(
            method = %call.method,
            select = select.alias(),
            "paging without orderBy yields a nondeterministic row order"
        );
    }

    let mut select = if select.limit.is_some() || (skip && select.offset.is_some()) {
        derived_table(select)?
    } else {
        select
    };
    if skip {
        select.offset = Some(count);
    } else {
        select.limit = Some(count);
    }
    Ok(SqlExpression::Select(Box::new(select)))
}

/// `first(pred?)` / `firstOrDefault(pred?)`
///
/// Inside an outer projection the single row is returned as a JSON object.
pub fn translate_first(
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
    select.limit = Some(select.limit.map_or(1, |limit| limit.min(1)));

    if ctx.is_nested() {
        Ok(json_subquery(visitor, select, true))
    } else {
        Ok(SqlExpression::Select(Box::new(select)))
    }
}
