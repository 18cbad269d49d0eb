// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LINQ-SQL - Lowering Layer
//!
//! This crate converts predicate/selector lambda source text into the
//! host-neutral expression tree.
//!
//! ## Overview
//!
//! The lowering layer is responsible for:
//! - Parsing lambda text with the tree-sitter JavaScript grammar
//! - Folding the syntax tree into [`linq_sql_expr::Expression`] nodes
//! - Resolving identifiers against nested lambda scopes and an external scope
//!
//! ## Lowering Process
//!
//! ```text
//! lambda text → Tree-sitter CST → Lowering → LambdaExpr → Translation → SQL tree
//! ```
//!
//! ## Identifier Resolution
//!
//! An identifier resolves against the innermost lambda's parameters first,
//! then each enclosing lambda outward, then the external scope. A lambda
//! nested in a method call argument sees every name its parent sees.
//!
//! ## Usage
//!
//! ```rust
//! use linq_sql_lowering::lower_lambda;
//!
//! let lambda = lower_lambda("u => u.age > 30", &[], None).unwrap();
//! assert_eq!(lambda.params[0].name(), "u");
//! assert_eq!(lambda.body.to_string(), "(u.age > 30)");
//! ```

pub mod context;
pub mod error;
pub mod lower;
pub mod parser;

pub use context::{DEFAULT_MAX_DEPTH, LoweringContext, ParameterScope};
pub use error::{LoweringError, LoweringResult};

use indexmap::IndexMap;
use linq_sql_expr::{Expression, LambdaExpr};

use crate::parser::SourceTree;

/// Lower lambda source text into a [`LambdaExpr`]
///
/// # Arguments
///
/// - `source`: arrow function or `function` expression text
/// - `scopes`: parameter scopes of the enclosing lambdas, outermost first
/// - `external`: names exposed to the lambda from outside any parameter list
///
/// # Errors
///
/// - `Parse` / `UnsupportedSyntax` / `MissingChild` / `InvalidLiteral` for
///   text outside the supported subset
/// - `UnresolvedIdentifier` for a name bound nowhere
pub fn lower_lambda(
    source: &str,
    scopes: &[ParameterScope],
    external: Option<&IndexMap<String, Expression>>,
) -> LoweringResult<LambdaExpr> {
    let tree = SourceTree::parse(source)?;
    let function = tree.function()?;
    let mut ctx = LoweringContext::new(tree.text(), scopes.to_vec(), external);
    lower::lower_function(&mut ctx, function)
}
