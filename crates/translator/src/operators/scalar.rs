// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! String and date instance methods

use std::sync::Arc;

use linq_sql_expr::{MethodCallExpr, Value};
use linq_sql_ir::{LikeExpr, SqlExpression, SqlOperator};

use super::{constant_arg, count_arg};
use crate::context::TranslationContext;
use crate::error::{TranslationError, TranslationResult};
use crate::visitor::{QueryVisitor, source_of};

/// Escape LIKE metacharacters as bracket classes
///
/// `[` is escaped first so the brackets introduced for `%` and `_` stay
/// intact.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '[' => escaped.push_str("[[]"),
            '%' => escaped.push_str("[%]"),
            '_' => escaped.push_str("[_]"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn receiver(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    visitor.visit(source_of(call)?, ctx)
}

/// `toUpperCase()`, `toLowerCase()`, `trim()`
pub fn translate_string_function(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let function = match call.method.as_str() {
        "toUpperCase" => "UPPER",
        "toLowerCase" => "LOWER",
        "trim" => "TRIM",
        _ => {
            return Err(TranslationError::UnsupportedMethod {
                method: call.method.clone(),
            });
        }
    };
    let source = receiver(visitor, call, ctx)?;
    Ok(SqlExpression::function(function, vec![source]))
}

/// `startsWith(s)` → `LIKE 's%'`, `endsWith(s)` → `LIKE '%s'`
pub fn translate_pattern(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let text = match constant_arg(call, 0, "a constant string")? {
        Value::String(text) => escape_like(text),
        _ => {
            return Err(TranslationError::NonConstantArgument {
                method: call.method.clone(),
                position: 0,
                expected: "a constant string".to_string(),
            });
        }
    };
    let pattern = if call.method == "endsWith" {
        format!("%{}", text)
    } else {
        format!("{}%", text)
    };

    let source = receiver(visitor, call, ctx)?;
    Ok(SqlExpression::Like(LikeExpr {
        source: Box::new(source),
        pattern,
    }))
}

/// `substring(start, end?)` with 0-based, end-exclusive indices
///
/// SQL SUBSTRING is 1-based and takes a length. Reversed bounds are
/// swapped; a missing end reads to the end of the string.
pub fn translate_substring(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let start = count_arg(call, 0)?;
    let end = match call.args.len() {
        2 => Some(count_arg(call, 1)?),
        _ => None,
    };
    let source = receiver(visitor, call, ctx)?;

    let (start, length) = match end {
        Some(end) => {
            let (low, high) = if end < start { (end, start) } else { (start, end) };
            (low, index_constant(high - low))
        }
        None => (start, SqlExpression::function("LEN", vec![source.clone()])),
    };
    Ok(SqlExpression::function(
        "SUBSTRING",
        vec![source, index_constant(start.saturating_add(1)), length],
    ))
}

fn index_constant(index: u64) -> SqlExpression {
    SqlExpression::constant(i64::try_from(index).unwrap_or(i64::MAX))
}

/// `getFullYear()` and friends
///
/// `getMonth` is 0-based, so the SQL month is shifted down by one.
pub fn translate_date_part(
    visitor: &mut QueryVisitor<'_>,
    call: &MethodCallExpr,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression> {
    let function = match call.method.as_str() {
        "getFullYear" => "YEAR",
        "getMonth" => "MONTH",
        "getDate" => "DAY",
        "getHours" => "HOUR",
        "getMinutes" => "MINUTE",
        "getSeconds" => "SECOND",
        _ => {
            return Err(TranslationError::UnsupportedMethod {
                method: call.method.clone(),
            });
        }
    };
    let part = SqlExpression::function(function, vec![receiver(visitor, call, ctx)?]);
    if call.method == "getMonth" {
        return Ok(SqlExpression::binary(
            part,
            SqlOperator::Subtract,
            SqlExpression::constant(1),
        ));
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("x%_"), "x[%][_]");
        assert_eq!(escape_like("[a]"), "[[]a]");
        assert_eq!(escape_like("plain"), "plain");
    }
}
