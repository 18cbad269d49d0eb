// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query Representation
//!
//! This module represents query-shaped SQL nodes.
//!
//! ## SELECT
//!
//! [`SelectExpr`] models one SELECT with its clauses:
//!
//! - **Alias**: every select carries one, so it can be used as a derived table
//! - **Projection**: at least one [`Projection`] (expression + output alias)
//! - **FROM**: a table, another select or a union
//! - **Joins**: [`JoinExpr`] list in SQL clause order
//! - **WHERE / GROUP BY / HAVING / ORDER BY**
//! - **OFFSET / LIMIT**: constant row counts
//!
//! ## Set Operations
//!
//! [`UnionExpr`] holds a flat list of selects; `distinct` selects
//! `UNION` versus `UNION ALL`. Its alias may start unassigned and is assigned
//! exactly once, when the union is first used as a data source.
//!
//! ## Subqueries
//!
//! - [`ExistsExpr`]: `EXISTS (SELECT 1 FROM ... WHERE ...)`
//! - [`ScalarSubqueryExpr`]: single-column, single-row subquery
//! - [`ScalarSubqueryAsJsonExpr`]: subquery whose rows are returned as JSON
//!
//! ### Example
//! ```sql
//! SELECT u.name AS name,
//!        (SELECT SUM(p.views) AS sum_result FROM Posts AS p
//!         WHERE p.authorId = u.id) AS views
//! FROM Users AS u
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{IrResult, StructuralError};
use crate::expr::{ColumnExpr, SqlExpression};

/// One output column of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    expr: SqlExpression,
    alias: String,
}

/// Suffix marking a flattened whole-row projection (`<member>_all`)
pub const WHOLE_ROW_SUFFIX: &str = "_all";

impl Projection {
    pub fn new(expr: SqlExpression, alias: impl Into<String>) -> IrResult<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(StructuralError::EmptyAlias {
                node: "Projection".to_string(),
            });
        }
        Ok(Self { expr, alias })
    }

    /// Whole-row projection of `column`'s table, aliased `alias`
    pub fn star(column: ColumnExpr, alias: impl Into<String>) -> IrResult<Self> {
        Self::new(SqlExpression::Column(column), alias)
    }

    pub fn expr(&self) -> &SqlExpression {
        &self.expr
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Star column when this projection stands for a whole row
    pub fn star_column(&self) -> Option<&ColumnExpr> {
        self.expr.as_column().filter(|c| c.is_star())
    }
}

/// Join kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    /// Metadata discriminant of the join node
    pub fn node_name(&self) -> &'static str {
        match self {
            JoinKind::Inner => "InnerJoin",
            JoinKind::Left => "LeftJoin",
        }
    }
}

/// INNER JOIN / LEFT JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr {
    pub kind: JoinKind,
    table: SqlExpression,
    pub predicate: SqlExpression,
}

impl JoinExpr {
    pub fn new(kind: JoinKind, table: SqlExpression, predicate: SqlExpression) -> IrResult<Self> {
        if !table.is_source() {
            return Err(StructuralError::InvalidSource {
                found: table.kind().to_string(),
            });
        }
        Ok(Self {
            kind,
            table,
            predicate,
        })
    }

    pub fn table(&self) -> &SqlExpression {
        &self.table
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: SqlExpression,
    pub direction: SortDirection,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    alias: String,
    projection: Vec<Projection>,
    from: Box<SqlExpression>,

    /// WHERE clause
    pub predicate: Option<SqlExpression>,

    /// HAVING clause
    pub having: Option<SqlExpression>,

    /// Joins, in clause order
    pub joins: Vec<JoinExpr>,

    /// ORDER BY terms, in declaration order
    pub order_by: Vec<OrderByExpr>,

    pub offset: Option<u64>,
    pub limit: Option<u64>,

    /// GROUP BY terms
    pub group_by: Vec<SqlExpression>,
}

impl SelectExpr {
    pub fn new(
        alias: impl Into<String>,
        projection: Vec<Projection>,
        from: SqlExpression,
    ) -> IrResult<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(StructuralError::EmptyAlias {
                node: "Select".to_string(),
            });
        }
        if projection.is_empty() {
            return Err(StructuralError::EmptyProjection { alias });
        }
        if !from.is_source() {
            return Err(StructuralError::InvalidSource {
                found: from.kind().to_string(),
            });
        }
        Ok(Self {
            alias,
            projection,
            from: Box::new(from),
            predicate: None,
            having: None,
            joins: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
            group_by: Vec::new(),
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn projection(&self) -> &[Projection] {
        &self.projection
    }

    pub fn from(&self) -> &SqlExpression {
        &self.from
    }

    /// Replace the projection list, keeping every other clause
    pub fn with_projection(mut self, projection: Vec<Projection>) -> IrResult<Self> {
        if projection.is_empty() {
            return Err(StructuralError::EmptyProjection { alias: self.alias });
        }
        self.projection = projection;
        Ok(self)
    }

    /// AND a predicate onto WHERE
    pub fn and_where(&mut self, predicate: SqlExpression) {
        self.predicate = Some(SqlExpression::and(self.predicate.take(), predicate));
    }

    /// AND a predicate onto HAVING
    pub fn and_having(&mut self, predicate: SqlExpression) {
        self.having = Some(SqlExpression::and(self.having.take(), predicate));
    }

    pub fn find_projection(&self, alias: &str) -> Option<&Projection> {
        self.projection.iter().find(|p| p.alias() == alias)
    }

    /// Projections that stand for whole rows
    pub fn star_projections(&self) -> impl Iterator<Item = &ColumnExpr> {
        self.projection.iter().filter_map(Projection::star_column)
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// OFFSET or LIMIT is set
    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

/// UNION / UNION ALL over a flat list of selects
#[derive(Debug, Clone, PartialEq)]
pub struct UnionExpr {
    sources: Vec<SelectExpr>,
    alias: Option<String>,
    /// `true` for UNION, `false` for UNION ALL
    pub distinct: bool,
}

impl UnionExpr {
    pub fn new(sources: Vec<SelectExpr>, distinct: bool) -> IrResult<Self> {
        if sources.is_empty() {
            return Err(StructuralError::EmptyUnion);
        }
        Ok(Self {
            sources,
            alias: None,
            distinct,
        })
    }

    pub fn sources(&self) -> &[SelectExpr] {
        &self.sources
    }

    pub fn push(&mut self, select: SelectExpr) {
        self.sources.push(select);
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Assign the alias; a union is aliased at most once
    pub fn assign_alias(&mut self, alias: impl Into<String>) -> IrResult<()> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(StructuralError::EmptyAlias {
                node: "Union".to_string(),
            });
        }
        if let Some(existing) = &self.alias {
            return Err(StructuralError::AliasAlreadyAssigned {
                existing: existing.clone(),
                requested: alias,
            });
        }
        self.alias = Some(alias);
        Ok(())
    }
}

/// EXISTS (subquery)
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsExpr {
    pub select: Box<SelectExpr>,
}

/// Scalar subquery
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSubqueryExpr {
    pub select: Box<SelectExpr>,
}

/// JSON rendering mode of a subquery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonMode {
    /// Nested objects follow projection aliases
    Path,
    /// Shape derived from the select structure
    Auto,
}

/// JSON rendering options of a subquery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct JsonFlags {
    /// Emit properties for NULL values
    pub include_null_values: bool,
    /// Return a single object instead of an array
    pub without_array_wrapper: bool,
}

/// Subquery rendered as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSubqueryAsJsonExpr {
    pub select: Box<SelectExpr>,
    pub mode: JsonMode,
    pub flags: JsonFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::TableExpr;

    fn users() -> TableExpr {
        TableExpr::new("Users", "u").unwrap()
    }

    #[test]
    fn test_select_requires_projection() {
        let err = SelectExpr::new("u", vec![], SqlExpression::Table(users())).unwrap_err();
        assert!(matches!(err, StructuralError::EmptyProjection { .. }));
    }

    #[test]
    fn test_select_requires_source() {
        let star = Projection::star(ColumnExpr::star(users()), "*").unwrap();
        let err = SelectExpr::new("u", vec![star], SqlExpression::constant(1)).unwrap_err();
        assert!(matches!(err, StructuralError::InvalidSource { .. }));
    }

    #[test]
    fn test_union_alias_assigned_once() {
        let star = Projection::star(ColumnExpr::star(users()), "*").unwrap();
        let select = SelectExpr::new("u", vec![star], SqlExpression::Table(users())).unwrap();
        let mut union = UnionExpr::new(vec![select], true).unwrap();
        assert!(union.alias().is_none());

        union.assign_alias("u1").unwrap();
        assert_eq!(union.alias(), Some("u1"));
        assert!(matches!(
            union.assign_alias("u2"),
            Err(StructuralError::AliasAlreadyAssigned { .. })
        ));
    }
}
