// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query expressions
//!
//! This module represents operator chains and their predicate/selector
//! lambdas before SQL lowering.
//!
//! ## Design
//!
//! Every operator call wraps the expression built so far in a
//! [`MethodCallExpr`], so a chain such as
//!
//! ```text
//! users.where(u => u.age > 30).select(u => u.email)
//! ```
//!
//! becomes
//!
//! ```text
//! MethodCall {
//!   method: "select",
//!   source: MethodCall {
//!     method: "where",
//!     source: Constant(Table("Users")),
//!     args: [Lambda { params: [u], body: Binary(u.age > 30) }]
//!   },
//!   args: [Lambda { params: [u], body: MemberAccess(u.email) }]
//! }
//! ```
//!
//! Nodes are immutable once built. Children are reference counted so that
//! chains can share upstream subtrees; trees never contain cycles.
//!
//! ## Parameter identity
//!
//! [`ParameterExpr`] compares by identity, not by name: two lambdas that both
//! name their parameter `u` produce two distinct parameters. This is what lets
//! a correlated inner lambda refer to the outer row unambiguously.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// A query expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Lambda parameter reference
    Parameter(ParameterExpr),

    /// Dot member access (e.g., `u.name`)
    MemberAccess(MemberAccessExpr),

    /// Constant value or root table marker
    Constant(ConstantValue),

    /// Literal written in lambda source
    Literal(Value),

    /// Binary operation (e.g., `a + b`, `x == 5`)
    Binary(BinaryExpr),

    /// Method call, either a query operator or an instance method
    MethodCall(MethodCallExpr),

    /// Anonymous function
    Lambda(LambdaExpr),

    /// Object literal (e.g., `{ name: u.name, total: o.total }`)
    NewObject(NewObjectExpr),

    /// Source wrapped with externally provided named bindings
    Scope(ScopeExpr),
}

impl Expression {
    /// Node kind name, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Parameter(_) => "Parameter",
            Expression::MemberAccess(_) => "MemberAccess",
            Expression::Constant(_) => "Constant",
            Expression::Literal(_) => "Literal",
            Expression::Binary(_) => "Binary",
            Expression::MethodCall(_) => "MethodCall",
            Expression::Lambda(_) => "Lambda",
            Expression::NewObject(_) => "NewObject",
            Expression::Scope(_) => "Scope",
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self {
            Expression::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterExpr> {
        match self {
            Expression::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// Value of a literal or non-table constant
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expression::Literal(v) | Expression::Constant(ConstantValue::Value(v)) => Some(v),
            _ => None,
        }
    }
}

/// Lambda parameter, compared by identity
#[derive(Clone)]
pub struct ParameterExpr(Arc<str>);

impl ParameterExpr {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Whether `other` is the very same parameter
    pub fn same_as(&self, other: &ParameterExpr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ParameterExpr {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for ParameterExpr {}

impl fmt::Debug for ParameterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({})", self.0)
    }
}

/// Member access
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccessExpr {
    pub object: Arc<Expression>,
    pub member: String,
}

/// Payload of a `Constant` node
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Root reference to a named table
    Table(TableMarker),
    /// Plain value
    Value(Value),
}

/// Marks a constant as a table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableMarker {
    pub name: String,
}

/// Binary operation
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Arc<Expression>,
    pub op: BinaryOperator,
    pub right: Arc<Expression>,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Comparison
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Map a host-language operator token
    pub fn from_host_operator(op: &str) -> Option<Self> {
        let op = match op {
            "==" | "===" => BinaryOperator::Equal,
            "!=" | "!==" => BinaryOperator::NotEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterThanOrEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessThanOrEqual,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "&&" => BinaryOperator::And,
            "||" => BinaryOperator::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

/// Method call
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpr {
    pub method: String,
    /// Receiver; `None` for free calls such as the internal ternary
    pub source: Option<Arc<Expression>>,
    pub args: Vec<Expression>,
}

/// Anonymous function
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub params: Vec<ParameterExpr>,
    pub body: Arc<Expression>,
}

/// Object literal with properties in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewObjectExpr {
    pub properties: IndexMap<String, Expression>,
}

/// External scope wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeExpr {
    pub source: Arc<Expression>,
    pub bindings: IndexMap<String, Expression>,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Parameter(p) => write!(f, "{}", p.name()),
            Expression::MemberAccess(m) => write!(f, "{}.{}", m.object, m.member),
            Expression::Constant(ConstantValue::Table(t)) => write!(f, "<{}>", t.name),
            Expression::Constant(ConstantValue::Value(v)) | Expression::Literal(v) => {
                write!(f, "{}", v)
            }
            Expression::Binary(b) => write!(f, "({} {} {})", b.left, b.op.symbol(), b.right),
            Expression::MethodCall(call) => {
                if let Some(source) = &call.source {
                    write!(f, "{}.", source)?;
                }
                write!(f, "{}(", call.method)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Lambda(lambda) => {
                let params: Vec<&str> = lambda.params.iter().map(|p| p.name()).collect();
                write!(f, "({}) => {}", params.join(", "), lambda.body)
            }
            Expression::NewObject(obj) => {
                write!(f, "{{ ")?;
                for (i, (name, value)) in obj.properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Expression::Scope(scope) => {
                let names: Vec<&str> = scope.bindings.keys().map(String::as_str).collect();
                write!(f, "{}.withScope({})", scope.source, names.join(", "))
            }
        }
    }
}
