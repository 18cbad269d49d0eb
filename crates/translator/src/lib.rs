// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # LINQ-SQL - Translator
//!
//! Lowers a query expression tree into a SQL expression tree.
//!
//! ## Architecture
//!
//! ```text
//! Expression ──► QueryVisitor ──► SqlExpression
//!                   │
//!                   ├── TranslationContext  (parameter → source bindings)
//!                   ├── AliasGenerator      (one per translate call)
//!                   └── OperatorRegistry    (method name → handler)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use linq_sql_expr::builder::{lambda, lit, param, table};
//! use linq_sql_translator::translate;
//!
//! let u = param("u");
//! let query = table("Users").call(
//!     "where",
//!     vec![lambda([u.clone()], u.to_expr().member("age").gt(lit(30)))],
//! );
//!
//! let sql = translate(&query).unwrap();
//! assert_eq!(sql.to_string(), "SELECT u.* FROM Users AS u WHERE (u.age > 30)");
//! ```

pub mod alias;
pub mod config;
pub mod context;
pub mod error;
pub mod operators;
pub mod registry;
pub mod visitor;

pub use alias::AliasGenerator;
pub use config::TranslatorConfig;
pub use context::{Binding, GroupBinding, TranslationContext};
pub use error::{ErrorKind, TranslationError, TranslationResult};
pub use registry::{OperatorHandler, OperatorRegistry, OperatorSpec};
pub use visitor::{QueryTranslator, QueryVisitor};

use linq_sql_expr::Expression;
use linq_sql_ir::SqlExpression;

/// Translate with the default configuration and operators
pub fn translate(expr: &Expression) -> TranslationResult<SqlExpression> {
    QueryTranslator::new().translate(expr)
}
