// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `groupBy(key, result?)`
//!
//! The key selector runs against the ungrouped row. Every parameter of the
//! result selector is bound to a group placeholder, so `g.key`, `key.dept`
//! and `g.count()` all resolve against the GROUP BY terms.

use std::sync::Arc;

use indexmap::IndexMap;
use linq_sql_expr::{Expression, MethodCallExpr};
use linq_sql_ir::{Projection, SqlExpression};

use super::build_projections;
use crate::context::{Binding, GROUP_KEY, GroupBinding, TranslationContext};
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, bind_lambda, lambda_arg};

pub fn translate_group_by(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let select = visitor.unpaged_source(call, ctx)?;
    if select.is_grouped() {
        return Err(TranslationError::unsupported(
            "groupBy over an already grouped query",
        ));
    }

    let key_selector = lambda_arg(call, 0)?;
    let bound = bind_lambda(key_selector, vec![visitor.binding_of(&select)], ctx)?;
    let mut keys = IndexMap::new();
    match key_selector.body.as_ref() {
        Expression::NewObject(object) => {
            for (name, value) in &object.properties {
                keys.insert(name.clone(), visitor.visit(value, &bound)?);
            }
        }
        body => {
            keys.insert(GROUP_KEY.to_string(), visitor.visit(body, &bound)?);
        }
    }

    let mut grouped = select.clone();
    grouped.group_by.extend(keys.values().cloned());
    let rows = SqlExpression::Select(Box::new(select));
    visitor.record_group_rows(grouped.alias(), rows.clone());

    let projection = match call.args.get(1) {
        Some(_) => {
            let selector = lambda_arg(call, 1)?;
            let group = Arc::new(GroupBinding::new(keys, rows));
            let bindings = vec![Binding::Group(group); selector.params.len()];
            let bound = bind_lambda(selector, bindings, ctx)?;
            build_projections(visitor, &selector.body, &bound, &grouped)?
        }
        None => keys
            .into_iter()
            .map(|(name, expr)| Projection::new(expr, name))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(SqlExpression::Select(Box::new(grouped.with_projection(projection)?)))
}
