// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL tree test helpers and custom assertions

use linq_sql_ir::{ColumnExpr, SelectExpr, SqlExpression, ToMetadata, UnionExpr, Value};

/// Custom assertion helpers for translated trees
pub struct SqlAssertions;

impl SqlAssertions {
    /// Assert that an expression is a select and return it
    pub fn expect_select(expr: &SqlExpression) -> &SelectExpr {
        match expr {
            SqlExpression::Select(select) => select,
            _ => panic!("Expected Select, found {}", expr.kind()),
        }
    }

    /// Assert that an expression is a union and return it
    pub fn expect_union(expr: &SqlExpression) -> &UnionExpr {
        match expr {
            SqlExpression::Union(union) => union,
            _ => panic!("Expected Union, found {}", expr.kind()),
        }
    }

    /// Assert that an expression is a scalar subquery and return its select
    pub fn expect_scalar_subquery(expr: &SqlExpression) -> &SelectExpr {
        match expr {
            SqlExpression::ScalarSubquery(subquery) => &subquery.select,
            _ => panic!("Expected ScalarSubquery, found {}", expr.kind()),
        }
    }

    /// Assert that an expression is a column reference `<alias>.<name>`
    pub fn assert_column(expr: &SqlExpression, alias: &str, name: &str) -> ColumnExpr {
        match expr {
            SqlExpression::Column(column) => {
                assert_eq!(column.name(), name, "Column name mismatch");
                assert_eq!(column.table().alias(), alias, "Column table alias mismatch");
                column.clone()
            }
            _ => panic!("Expected Column {}.{}, found {}", alias, name, expr),
        }
    }

    /// Assert that an expression is a constant with the given value
    pub fn assert_constant(expr: &SqlExpression, value: impl Into<Value>) {
        let value = value.into();
        match expr.as_constant() {
            Some(v) => assert_eq!(v, &value, "Constant value mismatch"),
            None => panic!("Expected Constant {}, found {}", value, expr),
        }
    }

    /// Output aliases of a select, in order
    pub fn projection_aliases(select: &SelectExpr) -> Vec<&str> {
        select.projection().iter().map(|p| p.alias()).collect()
    }

    /// Expression of the projection aliased `alias`
    pub fn projected<'s>(select: &'s SelectExpr, alias: &str) -> &'s SqlExpression {
        match select.find_projection(alias) {
            Some(projection) => projection.expr(),
            None => panic!(
                "No projection '{}' in [{}]",
                alias,
                Self::projection_aliases(select).join(", ")
            ),
        }
    }

    /// Assert the debug text form
    pub fn assert_text(expr: &SqlExpression, expected: &str) {
        assert_eq!(expr.to_string(), expected, "Debug text mismatch");
    }

    /// Assert that two trees have identical metadata
    pub fn assert_same_metadata(left: &SqlExpression, right: &SqlExpression) {
        assert_eq!(
            serde_json::to_string(&left.to_metadata()).ok(),
            serde_json::to_string(&right.to_metadata()).ok(),
            "Metadata differs:\n  left:  {}\n  right: {}",
            left,
            right
        );
    }
}
