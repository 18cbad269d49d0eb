// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Syntax tree → expression folding
//!
//! Each `lower_*` function handles one grammar node kind. Functions nested in
//! call arguments are lowered as [`LambdaExpr`] under an extended scope
//! stack, which is what lets an inner predicate refer to an outer row.

use std::sync::Arc;

use indexmap::IndexMap;
use linq_sql_expr::builder::TERNARY_METHOD;
use linq_sql_expr::{
    BinaryExpr, BinaryOperator, Expression, LambdaExpr, MemberAccessExpr, MethodCallExpr,
    NewObjectExpr, ParameterExpr, Value,
};
use tree_sitter::Node;

use crate::context::{LoweringContext, ParameterScope};
use crate::error::{LoweringError, LoweringResult};
use crate::parser::{FUNCTION_KINDS, significant_children};

/// Require a field child, reporting the parent fragment when missing
fn require_child<'t>(
    ctx: &LoweringContext<'_>,
    node: Node<'t>,
    field: &str,
) -> LoweringResult<Node<'t>> {
    node.child_by_field_name(field)
        .ok_or_else(|| LoweringError::MissingChild {
            context: ctx.fragment(node),
            expected: field.to_string(),
        })
}

/// Sole significant child of a wrapper node
fn single_child<'t>(
    ctx: &LoweringContext<'_>,
    node: Node<'t>,
    expected: &str,
) -> LoweringResult<Node<'t>> {
    let mut children = significant_children(node);
    match (children.next(), children.next()) {
        (Some(child), None) => Ok(child),
        (None, _) => Err(LoweringError::MissingChild {
            context: ctx.fragment(node),
            expected: expected.to_string(),
        }),
        (Some(_), Some(_)) => Err(LoweringError::unsupported(
            format!("multiple {}s", expected),
            &ctx.fragment(node),
        )),
    }
}

/// Lower a function node into a lambda
///
/// The lambda's own parameters form a new innermost scope for its body.
pub fn lower_function(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<LambdaExpr> {
    let params = function_parameters(ctx, node)?;
    let scope: ParameterScope = params
        .iter()
        .map(|p| (p.name().to_string(), p.clone()))
        .collect();

    let body_node = require_child(ctx, node, "body")?;

    ctx.push_scope(scope);
    let body = lower_body(ctx, body_node);
    ctx.pop_scope();

    Ok(LambdaExpr {
        params,
        body: Arc::new(body?),
    })
}

/// Positional parameter identifiers, as fresh parameters
fn function_parameters(
    ctx: &LoweringContext<'_>,
    node: Node<'_>,
) -> LoweringResult<Vec<ParameterExpr>> {
    // `u => ...` has a single `parameter` field
    if let Some(single) = node.child_by_field_name("parameter") {
        return Ok(vec![parameter(ctx, single)?]);
    }

    let list = require_child(ctx, node, "parameters")?;
    significant_children(list)
        .map(|p| parameter(ctx, p))
        .collect()
}

fn parameter(ctx: &LoweringContext<'_>, node: Node<'_>) -> LoweringResult<ParameterExpr> {
    if node.kind() != "identifier" {
        return Err(LoweringError::Parse {
            message: format!("parameter must be a plain identifier, found {}", node.kind()),
            fragment: ctx.fragment(node),
        });
    }
    Ok(ParameterExpr::new(ctx.text(node)?))
}

/// Expression body, or a block holding exactly one `return <expr>;`
fn lower_body(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    if node.kind() != "statement_block" {
        return lower_expression(ctx, node);
    }

    let statement = single_child(ctx, node, "return statement")?;
    if statement.kind() != "return_statement" {
        return Err(LoweringError::unsupported(
            format!("{} in function body", statement.kind()),
            &ctx.fragment(statement),
        ));
    }
    let value = single_child(ctx, statement, "return value")?;
    lower_expression(ctx, value)
}

/// Lower any expression node
pub fn lower_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    ctx.enter_recursive_context()?;
    let result = lower_expression_inner(ctx, node);
    ctx.exit_recursive_context();
    result
}

fn lower_expression_inner(
    ctx: &mut LoweringContext<'_>,
    node: Node<'_>,
) -> LoweringResult<Expression> {
    match node.kind() {
        "identifier" => ctx.resolve(ctx.text(node)?, node),
        "parenthesized_expression" => {
            let inner = single_child(ctx, node, "expression")?;
            lower_expression(ctx, inner)
        }
        "member_expression" => lower_member(ctx, node),
        "subscript_expression" => Err(LoweringError::Parse {
            message: "computed member access is not supported".to_string(),
            fragment: ctx.fragment(node),
        }),
        "binary_expression" => lower_binary(ctx, node),
        "unary_expression" => lower_unary(ctx, node),
        "ternary_expression" => lower_ternary(ctx, node),
        "call_expression" => lower_call(ctx, node),
        "object" => lower_object(ctx, node),
        "array" => lower_array(ctx, node),
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined" => {
            Ok(Expression::Literal(literal_value(ctx, node)?))
        }
        kind if FUNCTION_KINDS.contains(&kind) => Err(LoweringError::unsupported(
            "function outside a method call argument",
            &ctx.fragment(node),
        )),
        kind => Err(LoweringError::unsupported(
            format!("{} expression", kind),
            &ctx.fragment(node),
        )),
    }
}

fn property_name(ctx: &LoweringContext<'_>, node: Node<'_>) -> LoweringResult<String> {
    let property = require_child(ctx, node, "property")?;
    if property.kind() != "property_identifier" {
        return Err(LoweringError::unsupported(
            format!("{} member", property.kind()),
            &ctx.fragment(node),
        ));
    }
    Ok(ctx.text(property)?.to_string())
}

fn lower_member(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let object = require_child(ctx, node, "object")?;
    let member = property_name(ctx, node)?;
    let object = lower_expression(ctx, object)?;
    Ok(Expression::MemberAccess(MemberAccessExpr {
        object: Arc::new(object),
        member,
    }))
}

fn lower_binary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let left = require_child(ctx, node, "left")?;
    let operator = require_child(ctx, node, "operator")?;
    let right = require_child(ctx, node, "right")?;

    let op = BinaryOperator::from_host_operator(operator.kind()).ok_or_else(|| {
        LoweringError::unsupported(
            format!("binary operator '{}'", operator.kind()),
            &ctx.fragment(node),
        )
    })?;

    Ok(Expression::Binary(BinaryExpr {
        left: Arc::new(lower_expression(ctx, left)?),
        op,
        right: Arc::new(lower_expression(ctx, right)?),
    }))
}

/// Only negation of a numeric literal is representable; it folds into the literal
fn lower_unary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let operator = require_child(ctx, node, "operator")?;
    let argument = require_child(ctx, node, "argument")?;

    if operator.kind() == "-" && argument.kind() == "number" {
        let value = match literal_value(ctx, argument)? {
            Value::Integer(i) => Value::Integer(-i),
            Value::Float(f) => Value::Float(-f),
            other => other,
        };
        return Ok(Expression::Literal(value));
    }

    Err(LoweringError::Parse {
        message: format!("unary operator '{}' is not supported", operator.kind()),
        fragment: ctx.fragment(node),
    })
}

fn lower_ternary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let mut args = Vec::with_capacity(3);
    for field in ["condition", "consequence", "alternative"] {
        let child = require_child(ctx, node, field)?;
        args.push(lower_expression(ctx, child)?);
    }
    Ok(Expression::MethodCall(MethodCallExpr {
        method: TERNARY_METHOD.to_string(),
        source: None,
        args,
    }))
}

/// `obj.method(args...)`; function arguments become nested lambdas
fn lower_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let callee = require_child(ctx, node, "function")?;
    if callee.kind() != "member_expression" {
        return Err(LoweringError::unsupported(
            "call whose callee is not a member access",
            &ctx.fragment(node),
        ));
    }
    let arguments = require_child(ctx, node, "arguments")?;
    if arguments.kind() != "arguments" {
        return Err(LoweringError::unsupported(
            "tagged template",
            &ctx.fragment(node),
        ));
    }

    let method = property_name(ctx, callee)?;
    let object = require_child(ctx, callee, "object")?;
    let source = lower_expression(ctx, object)?;

    let mut args = Vec::new();
    for arg in significant_children(arguments) {
        let lowered = if FUNCTION_KINDS.contains(&arg.kind()) {
            Expression::Lambda(lower_function(ctx, arg)?)
        } else if arg.kind() == "spread_element" {
            return Err(LoweringError::unsupported("spread argument", &ctx.fragment(arg)));
        } else {
            lower_expression(ctx, arg)?
        };
        args.push(lowered);
    }

    Ok(Expression::MethodCall(MethodCallExpr {
        method,
        source: Some(Arc::new(source)),
        args,
    }))
}

/// Object literal; `{ x }` lowers as `{ x: x }`
fn lower_object(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let mut properties = IndexMap::new();

    for entry in significant_children(node) {
        match entry.kind() {
            "pair" => {
                let key = require_child(ctx, entry, "key")?;
                let name = match key.kind() {
                    "property_identifier" => ctx.text(key)?.to_string(),
                    "string" => match literal_value(ctx, key)? {
                        Value::String(s) => s,
                        _ => unsupported_key(ctx, key)?,
                    },
                    "computed_property_name" => {
                        return Err(LoweringError::unsupported(
                            "computed property key",
                            &ctx.fragment(entry),
                        ));
                    }
                    _ => unsupported_key(ctx, key)?,
                };
                let value = require_child(ctx, entry, "value")?;
                if FUNCTION_KINDS.contains(&value.kind()) {
                    return Err(LoweringError::unsupported(
                        "function-valued property",
                        &ctx.fragment(entry),
                    ));
                }
                let value = lower_expression(ctx, value)?;
                properties.insert(name, value);
            }
            "shorthand_property_identifier" => {
                let name = ctx.text(entry)?;
                let value = ctx.resolve(name, entry)?;
                properties.insert(name.to_string(), value);
            }
            "method_definition" => {
                return Err(LoweringError::unsupported(
                    "method property",
                    &ctx.fragment(entry),
                ));
            }
            kind => {
                return Err(LoweringError::unsupported(
                    format!("{} in object literal", kind),
                    &ctx.fragment(entry),
                ));
            }
        }
    }

    Ok(Expression::NewObject(NewObjectExpr { properties }))
}

fn unsupported_key<T>(ctx: &LoweringContext<'_>, key: Node<'_>) -> LoweringResult<T> {
    Err(LoweringError::unsupported(
        format!("{} property key", key.kind()),
        &ctx.fragment(key),
    ))
}

/// Array of literals → one array literal
fn lower_array(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Expression> {
    let mut values = Vec::new();
    for element in significant_children(node) {
        match lower_expression(ctx, element)? {
            Expression::Literal(v) => values.push(v),
            other => {
                return Err(LoweringError::unsupported(
                    format!("non-literal array element ({})", other.kind_name()),
                    &ctx.fragment(element),
                ));
            }
        }
    }
    Ok(Expression::Literal(Value::Array(values)))
}

fn literal_value(ctx: &LoweringContext<'_>, node: Node<'_>) -> LoweringResult<Value> {
    match node.kind() {
        "true" => Ok(Value::Boolean(true)),
        "false" => Ok(Value::Boolean(false)),
        "null" | "undefined" => Ok(Value::Null),
        "number" => parse_number(ctx.text(node)?),
        "string" | "template_string" => string_value(ctx, node).map(Value::String),
        kind => Err(LoweringError::InvalidLiteral {
            value: ctx.fragment(node),
            type_name: kind.to_string(),
        }),
    }
}

/// Integer when the literal is integral and fits in `i64`, float otherwise
fn parse_number(text: &str) -> LoweringResult<Value> {
    let invalid = || LoweringError::InvalidLiteral {
        value: text.to_string(),
        type_name: "number".to_string(),
    };
    let digits: String = text.chars().filter(|c| *c != '_').collect();

    let radix = match digits.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return i64::from_str_radix(&digits[2..], radix)
            .map(Value::Integer)
            .map_err(|_| invalid());
    }

    if let Ok(i) = digits.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    match digits.parse::<f64>() {
        // `1e3` and `30.0` are integral
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Value::Integer(f as i64))
        }
        Ok(f) if f.is_finite() => Ok(Value::Float(f)),
        _ => Err(invalid()),
    }
}

/// Decoded content of a string or substitution-free template literal
fn string_value(ctx: &LoweringContext<'_>, node: Node<'_>) -> LoweringResult<String> {
    let mut out = String::new();
    for part in significant_children(node) {
        match part.kind() {
            "string_fragment" => out.push_str(ctx.text(part)?),
            "escape_sequence" => out.push_str(&decode_escape(ctx.text(part)?).ok_or_else(
                || LoweringError::InvalidLiteral {
                    value: ctx.fragment(part),
                    type_name: "escape sequence".to_string(),
                },
            )?),
            "template_substitution" => {
                return Err(LoweringError::unsupported(
                    "template substitution",
                    &ctx.fragment(part),
                ));
            }
            kind => {
                return Err(LoweringError::unsupported(
                    format!("{} in string literal", kind),
                    &ctx.fragment(part),
                ));
            }
        }
    }
    Ok(out)
}

fn decode_escape(escape: &str) -> Option<String> {
    let body = escape.strip_prefix('\\')?;
    let decoded = match body {
        "n" => "\n".to_string(),
        "t" => "\t".to_string(),
        "r" => "\r".to_string(),
        "b" => "\u{8}".to_string(),
        "f" => "\u{c}".to_string(),
        "v" => "\u{b}".to_string(),
        "0" => "\0".to_string(),
        _ if body.starts_with("u{") => {
            let hex = body.strip_prefix("u{")?.strip_suffix('}')?;
            char::from_u32(u32::from_str_radix(hex, 16).ok()?)?.to_string()
        }
        _ if body.starts_with('u') || body.starts_with('x') => {
            char::from_u32(u32::from_str_radix(&body[1..], 16).ok()?)?.to_string()
        }
        // Line continuation
        _ if body.starts_with('\n') || body.starts_with('\r') => String::new(),
        _ => body.to_string(),
    };
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("30").unwrap(), Value::Integer(30));
        assert_eq!(parse_number("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(parse_number("1_000").unwrap(), Value::Integer(1000));
        assert_eq!(parse_number("0xff").unwrap(), Value::Integer(255));
        assert_eq!(parse_number("1e3").unwrap(), Value::Integer(1000));
        assert_eq!(parse_number("30.0").unwrap(), Value::Integer(30));
        assert_eq!(parse_number("2.5e-1").unwrap(), Value::Float(0.25));
        assert_eq!(parse_number("1e19").unwrap(), Value::Float(1e19));
        assert!(parse_number("1e999").is_err());
    }

    #[test]
    fn test_decode_escape() {
        assert_eq!(decode_escape("\\n").as_deref(), Some("\n"));
        assert_eq!(decode_escape("\\'").as_deref(), Some("'"));
        assert_eq!(decode_escape("\\u0041").as_deref(), Some("A"));
        assert_eq!(decode_escape("\\u{1F600}").as_deref(), Some("\u{1F600}"));
        assert_eq!(decode_escape("\\x41").as_deref(), Some("A"));
        assert_eq!(decode_escape("\\uZZZZ"), None);
    }
}
