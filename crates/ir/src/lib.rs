// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LINQ-SQL - SQL Expression Tree
//!
//! This crate provides the SQL-shaped tree that query translation lowers into.
//! The tree is designed to:
//! - Mirror SQL clause structure for a downstream text renderer
//! - Reject invalid shapes at construction (structural invariants)
//! - Serialize to a plain metadata form for structural assertions
//! - Offer a debug text form that is never used as actual SQL

pub mod display;
pub mod error;
pub mod expr;
pub mod metadata;
pub mod query;

// Re-export commonly used types
pub use error::{IrResult, StructuralError};
pub use expr::{
    BinaryExpr, CaseExpr, ColumnExpr, ConstantExpr, FunctionCallExpr, InExpr, LikeExpr,
    SqlExpression, SqlOperator, STAR, TableExpr, WhenClause,
};
pub use linq_sql_expr::Value;
pub use metadata::ToMetadata;
pub use query::{
    ExistsExpr, JoinExpr, JoinKind, JsonFlags, JsonMode, OrderByExpr, Projection,
    ScalarSubqueryAsJsonExpr, ScalarSubqueryExpr, SelectExpr, SortDirection, UnionExpr,
    WHOLE_ROW_SUFFIX,
};
