// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! `union` (UNION) and `concat` (UNION ALL)

use std::sync::Arc;

use linq_sql_expr::MethodCallExpr;
use linq_sql_ir::{SqlExpression, UnionExpr};

use crate::context::TranslationContext;
use crate::error::TranslationResult;
use crate::visitor::{QueryVisitor, source_of};

/// Chains of the same set operation flatten into one union
pub fn translate_set_operation(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let distinct = call.method == "union";
    let left = visitor.visit(source_of(call)?, ctx)?;
    let right = visitor.visit(&call.args[0], ctx)?;

    match left {
        SqlExpression::Union(mut union) if union.alias().is_none() && union.distinct == distinct => {
            union.push(visitor.as_select(right)?);
            Ok(SqlExpression::Union(union))
        }
        left => {
            let left = visitor.as_select(left)?;
            let right = visitor.as_select(right)?;
            Ok(SqlExpression::Union(UnionExpr::new(vec![left, right], distinct)?))
        }
    }
}
