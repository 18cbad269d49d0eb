// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LINQ-SQL - Query Expressions
//!
//! This crate provides the host-neutral expression tree that operator chains
//! and their predicate/selector lambdas are lowered into before translation
//! to SQL. The tree is designed to:
//! - Be immutable and cheaply shareable between chains
//! - Identify lambda parameters by identity, not by name
//! - Carry scalar values as a closed, exhaustively matchable union

pub mod builder;
pub mod expression;
pub mod value;

// Re-export commonly used types
pub use expression::{
    BinaryExpr, BinaryOperator, ConstantValue, Expression, LambdaExpr, MemberAccessExpr,
    MethodCallExpr, NewObjectExpr, ParameterExpr, ScopeExpr, TableMarker,
};
pub use value::Value;
