// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Operator registry
//!
//! Maps each method name to a typed handler plus the argument counts it
//! accepts. The count is validated before the handler runs, so handlers may
//! index their arguments within that range.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::{Arc, LazyLock};

use linq_sql_expr::MethodCallExpr;
use linq_sql_ir::SqlExpression;

use crate::context::TranslationContext;
use crate::error::{TranslationError, TranslationResult};
use crate::operators::{aggregate, group, join, predicate, query, scalar, set};
use crate::visitor::QueryVisitor;

/// Lowering rule of one operator
pub type OperatorHandler = fn(
    &mut QueryVisitor<'_>,
    &MethodCallExpr,
    &Arc<TranslationContext>,
) -> TranslationResult<SqlExpression>;

/// A registered operator
#[derive(Clone)]
pub struct OperatorSpec {
    pub arity: RangeInclusive<usize>,
    pub handler: OperatorHandler,
}

impl OperatorSpec {
    /// Validate the argument count of `call`
    pub fn check_arity(&self, call: &MethodCallExpr) -> TranslationResult<()> {
        if self.arity.contains(&call.args.len()) {
            return Ok(());
        }
        let (min, max) = (*self.arity.start(), *self.arity.end());
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        Err(TranslationError::ArgumentCount {
            method: call.method.clone(),
            expected,
            found: call.args.len(),
        })
    }
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Operator registry
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, OperatorSpec>,
}

static STANDARD: LazyLock<Arc<OperatorRegistry>> =
    LazyLock::new(|| Arc::new(OperatorRegistry::standard()));

impl OperatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard registry, built once per process
    pub fn shared() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Registry with every built-in operator
    pub fn standard() -> Self {
        let mut registry = Self::new();

        // Query shaping
        registry
            .register("where", 1..=1, query::translate_where)
            .register("select", 1..=1, query::translate_select)
            .register("orderBy", 1..=1, query::translate_order_by)
            .register("orderByDescending", 1..=1, query::translate_order_by)
            .register("thenBy", 1..=1, query::translate_order_by)
            .register("thenByDescending", 1..=1, query::translate_order_by)
            .register("skip", 1..=1, query::translate_paging)
            .register("take", 1..=1, query::translate_paging)
            .register("first", 0..=1, query::translate_first)
            .register("firstOrDefault", 0..=1, query::translate_first);

        // Joins and grouping
        registry
            .register("join", 3..=4, join::translate_join)
            .register("leftJoin", 3..=4, join::translate_join)
            .register("groupBy", 1..=2, group::translate_group_by);

        // Aggregates
        registry
            .register("count", 0..=1, aggregate::translate_aggregate)
            .register("sum", 0..=1, aggregate::translate_aggregate)
            .register("avg", 0..=1, aggregate::translate_aggregate)
            .register("min", 0..=1, aggregate::translate_aggregate)
            .register("max", 0..=1, aggregate::translate_aggregate);

        // Set operations
        registry
            .register("union", 1..=1, set::translate_set_operation)
            .register("concat", 1..=1, set::translate_set_operation);

        // Predicates
        registry
            .register("exists", 0..=1, predicate::translate_exists)
            .register("any", 0..=1, predicate::translate_exists)
            .register("includes", 1..=1, predicate::translate_includes)
            .register("ternary", 3..=3, predicate::translate_ternary);

        // Instance methods
        registry
            .register("toUpperCase", 0..=0, scalar::translate_string_function)
            .register("toLowerCase", 0..=0, scalar::translate_string_function)
            .register("trim", 0..=0, scalar::translate_string_function)
            .register("startsWith", 1..=1, scalar::translate_pattern)
            .register("endsWith", 1..=1, scalar::translate_pattern)
            .register("substring", 1..=2, scalar::translate_substring)
            .register("getFullYear", 0..=0, scalar::translate_date_part)
            .register("getMonth", 0..=0, scalar::translate_date_part)
            .register("getDate", 0..=0, scalar::translate_date_part)
            .register("getHours", 0..=0, scalar::translate_date_part)
            .register("getMinutes", 0..=0, scalar::translate_date_part)
            .register("getSeconds", 0..=0, scalar::translate_date_part);

        registry
    }

    /// Register (or replace) an operator
    pub fn register(
        &mut self,
        name: impl Into<String>,
        arity: RangeInclusive<usize>,
        handler: OperatorHandler,
    ) -> &mut Self {
        self.operators
            .insert(name.into(), OperatorSpec { arity, handler });
        self
    }

    pub fn get(&self, name: &str) -> Option<&OperatorSpec> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linq_sql_expr::builder::lit;

    #[test]
    fn test_standard_registry() {
        let registry = OperatorRegistry::standard();
        for name in ["where", "select", "join", "groupBy", "count", "union", "includes"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(!registry.contains("distinct"));
        assert!(Arc::ptr_eq(&OperatorRegistry::shared(), &OperatorRegistry::shared()));
    }

    #[test]
    fn test_arity_check() {
        let registry = OperatorRegistry::standard();
        let spec = registry.get("substring").unwrap();

        let call = MethodCallExpr {
            method: "substring".to_string(),
            source: None,
            args: vec![lit(1), lit(2), lit(3)],
        };
        assert_eq!(
            spec.check_arity(&call),
            Err(TranslationError::ArgumentCount {
                method: "substring".to_string(),
                expected: "1 to 2".to_string(),
                found: 3,
            })
        );
    }
}
