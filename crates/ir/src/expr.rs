// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL expressions
//!
//! This module holds the [`SqlExpression`] node taxonomy and its scalar
//! members. Query-shaped nodes (SELECT, UNION, subqueries) live in
//! [`crate::query`].
//!
//! ## Design
//!
//! The tree mirrors SQL clause structure and is the lowering target of
//! translation. Nodes that carry invariants keep their fields private and are
//! built through fallible constructors, so an invalid tree cannot be observed:
//!
//! - [`TableExpr`] always has a non-empty name and alias
//! - [`ColumnExpr`] always references its owning table node
//! - [`InExpr`] always has at least one constant value
//! - [`CaseExpr`] always has at least one WHEN/THEN clause
//!
//! ## Expression Hierarchy
//!
//! ```text
//! Binary {
//!   left: Column { name: "age", table: Table { name: "Users", alias: "u" } },
//!   op: GreaterThan,
//!   right: Constant(30)
//! }
//! ```
//!
//! Represents: `u.age > 30`

use linq_sql_expr::Value;
use serde::{Deserialize, Serialize};

use crate::error::{IrResult, StructuralError};
use crate::query::{
    ExistsExpr, ScalarSubqueryAsJsonExpr, ScalarSubqueryExpr, SelectExpr, UnionExpr,
};

/// A SQL expression node
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpression {
    /// Table occurrence with its alias
    Table(TableExpr),

    /// Column of an owning table
    Column(ColumnExpr),

    /// Constant value
    Constant(ConstantExpr),

    /// SELECT statement (top level, derived table or subquery body)
    Select(Box<SelectExpr>),

    /// Binary operation (e.g., `a + b`, `x = 5`)
    Binary(BinaryExpr),

    /// LIKE against a constant pattern
    Like(LikeExpr),

    /// IN against a constant value list
    In(InExpr),

    /// CASE expression
    Case(CaseExpr),

    /// Function call (e.g., `COUNT(1)`, `UPPER(name)`)
    FunctionCall(FunctionCallExpr),

    /// EXISTS (subquery)
    Exists(ExistsExpr),

    /// Single-value correlated subquery
    ScalarSubquery(ScalarSubqueryExpr),

    /// Subquery returning its rows as a JSON document
    ScalarSubqueryAsJson(ScalarSubqueryAsJsonExpr),

    /// UNION [ALL] of selects
    Union(UnionExpr),
}

impl SqlExpression {
    /// Discriminant name, identical to the metadata `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            SqlExpression::Table(_) => "Table",
            SqlExpression::Column(_) => "Column",
            SqlExpression::Constant(_) => "Constant",
            SqlExpression::Select(_) => "Select",
            SqlExpression::Binary(_) => "Binary",
            SqlExpression::Like(_) => "Like",
            SqlExpression::In(_) => "In",
            SqlExpression::Case(_) => "Case",
            SqlExpression::FunctionCall(_) => "FunctionCall",
            SqlExpression::Exists(_) => "Exists",
            SqlExpression::ScalarSubquery(_) => "ScalarSubquery",
            SqlExpression::ScalarSubqueryAsJson(_) => "ScalarSubqueryAsJson",
            SqlExpression::Union(_) => "Union",
        }
    }

    /// Whether this node can appear in FROM or as a JOIN target
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            SqlExpression::Table(_) | SqlExpression::Select(_) | SqlExpression::Union(_)
        )
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        SqlExpression::Constant(ConstantExpr {
            value: value.into(),
        })
    }

    pub fn binary(left: SqlExpression, op: SqlOperator, right: SqlExpression) -> Self {
        SqlExpression::Binary(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn function(name: impl Into<String>, args: Vec<SqlExpression>) -> Self {
        SqlExpression::FunctionCall(FunctionCallExpr {
            name: name.into(),
            args,
        })
    }

    /// Conjunction of an optional existing predicate with a new one
    pub fn and(existing: Option<SqlExpression>, next: SqlExpression) -> Self {
        match existing {
            Some(existing) => SqlExpression::binary(existing, SqlOperator::And, next),
            None => next,
        }
    }

    pub fn as_table(&self) -> Option<&TableExpr> {
        match self {
            SqlExpression::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnExpr> {
        match self {
            SqlExpression::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectExpr> {
        match self {
            SqlExpression::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            SqlExpression::Constant(c) => Some(&c.value),
            _ => None,
        }
    }
}

/// Table occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableExpr {
    name: String,
    alias: String,
}

impl TableExpr {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> IrResult<Self> {
        let name = name.into();
        let alias = alias.into();
        if name.is_empty() {
            return Err(StructuralError::EmptyName {
                node: "Table".to_string(),
            });
        }
        if alias.is_empty() {
            return Err(StructuralError::EmptyAlias {
                node: "Table".to_string(),
            });
        }
        Ok(Self { name, alias })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// Column reference, always owned by a table node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    name: String,
    table: TableExpr,
}

/// Column name used for whole-row projections
pub const STAR: &str = "*";

impl ColumnExpr {
    pub fn new(name: impl Into<String>, table: TableExpr) -> IrResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(StructuralError::EmptyName {
                node: "Column".to_string(),
            });
        }
        Ok(Self { name, table })
    }

    /// Whole-row column (`alias.*`)
    pub fn star(table: TableExpr) -> Self {
        Self {
            name: STAR.to_string(),
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TableExpr {
        &self.table
    }

    pub fn is_star(&self) -> bool {
        self.name == STAR
    }
}

/// Constant value
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Value,
}

/// Binary operation
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<SqlExpression>,
    pub op: SqlOperator,
    pub right: Box<SqlExpression>,
}

/// SQL binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlOperator {
    // Comparison
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl SqlOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            SqlOperator::Equal
                | SqlOperator::NotEqual
                | SqlOperator::GreaterThan
                | SqlOperator::GreaterThanOrEqual
                | SqlOperator::LessThan
                | SqlOperator::LessThanOrEqual
        )
    }

    /// Operator that keeps the truth value when both operands swap sides
    ///
    /// Returns `None` for operators that are not comparisons.
    pub fn flipped(&self) -> Option<SqlOperator> {
        let op = match self {
            SqlOperator::Equal => SqlOperator::Equal,
            SqlOperator::NotEqual => SqlOperator::NotEqual,
            SqlOperator::GreaterThan => SqlOperator::LessThan,
            SqlOperator::GreaterThanOrEqual => SqlOperator::LessThanOrEqual,
            SqlOperator::LessThan => SqlOperator::GreaterThan,
            SqlOperator::LessThanOrEqual => SqlOperator::GreaterThanOrEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            SqlOperator::Equal => "=",
            SqlOperator::NotEqual => "<>",
            SqlOperator::GreaterThan => ">",
            SqlOperator::GreaterThanOrEqual => ">=",
            SqlOperator::LessThan => "<",
            SqlOperator::LessThanOrEqual => "<=",
            SqlOperator::And => "AND",
            SqlOperator::Or => "OR",
            SqlOperator::Add => "+",
            SqlOperator::Subtract => "-",
            SqlOperator::Multiply => "*",
            SqlOperator::Divide => "/",
            SqlOperator::Modulo => "%",
        }
    }
}

/// LIKE with a constant, already escaped pattern
#[derive(Debug, Clone, PartialEq)]
pub struct LikeExpr {
    pub source: Box<SqlExpression>,
    pub pattern: String,
}

/// IN against constants
#[derive(Debug, Clone, PartialEq)]
pub struct InExpr {
    expr: Box<SqlExpression>,
    values: Vec<Value>,
}

impl InExpr {
    pub fn new(expr: SqlExpression, values: Vec<Value>) -> IrResult<Self> {
        if values.is_empty() {
            return Err(StructuralError::EmptyInList);
        }
        Ok(Self {
            expr: Box::new(expr),
            values,
        })
    }

    pub fn expr(&self) -> &SqlExpression {
        &self.expr
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// One WHEN ... THEN ... branch
#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub when: SqlExpression,
    pub then: SqlExpression,
}

/// CASE expression
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    when_clauses: Vec<WhenClause>,
    else_result: Option<Box<SqlExpression>>,
}

impl CaseExpr {
    pub fn new(when_clauses: Vec<WhenClause>, else_result: Option<SqlExpression>) -> IrResult<Self> {
        if when_clauses.is_empty() {
            return Err(StructuralError::EmptyCase);
        }
        Ok(Self {
            when_clauses,
            else_result: else_result.map(Box::new),
        })
    }

    pub fn when_clauses(&self) -> &[WhenClause] {
        &self.when_clauses
    }

    pub fn else_result(&self) -> Option<&SqlExpression> {
        self.else_result.as_deref()
    }
}

/// Function call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallExpr {
    pub name: String,
    pub args: Vec<SqlExpression>,
}
