// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Composable node constructors
//!
//! Builds the same trees that source lowering produces, without going through
//! lambda source text:
//!
//! ```rust
//! use linq_sql_expr::builder::{lambda, lit, param, table};
//!
//! let u = param("u");
//! let query = table("Users").call(
//!     "where",
//!     vec![lambda([u.clone()], u.to_expr().member("age").gt(lit(30)))],
//! );
//! assert_eq!(query.kind_name(), "MethodCall");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use crate::expression::{
    BinaryExpr, BinaryOperator, ConstantValue, Expression, LambdaExpr, MemberAccessExpr,
    MethodCallExpr, NewObjectExpr, ParameterExpr, ScopeExpr, TableMarker,
};
use crate::value::Value;

/// Name of the internal free call that stands for `test ? then : else`
pub const TERNARY_METHOD: &str = "ternary";

pub fn param(name: &str) -> ParameterExpr {
    ParameterExpr::new(name)
}

/// Root table reference
pub fn table(name: impl Into<String>) -> Expression {
    Expression::Constant(ConstantValue::Table(TableMarker { name: name.into() }))
}

pub fn lit(value: impl Into<Value>) -> Expression {
    Expression::Literal(value.into())
}

pub fn constant(value: impl Into<Value>) -> Expression {
    Expression::Constant(ConstantValue::Value(value.into()))
}

pub fn lambda(params: impl IntoIterator<Item = ParameterExpr>, body: Expression) -> Expression {
    Expression::Lambda(LambdaExpr {
        params: params.into_iter().collect(),
        body: Arc::new(body),
    })
}

pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, Expression)>) -> Expression {
    Expression::NewObject(NewObjectExpr {
        properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    })
}

pub fn ternary(test: Expression, then: Expression, otherwise: Expression) -> Expression {
    Expression::MethodCall(MethodCallExpr {
        method: TERNARY_METHOD.to_string(),
        source: None,
        args: vec![test, then, otherwise],
    })
}

impl ParameterExpr {
    pub fn to_expr(&self) -> Expression {
        Expression::Parameter(self.clone())
    }
}

impl From<ParameterExpr> for Expression {
    fn from(p: ParameterExpr) -> Self {
        Expression::Parameter(p)
    }
}

impl Expression {
    pub fn member(self, name: impl Into<String>) -> Expression {
        Expression::MemberAccess(MemberAccessExpr {
            object: Arc::new(self),
            member: name.into(),
        })
    }

    pub fn binary(self, op: BinaryOperator, right: Expression) -> Expression {
        Expression::Binary(BinaryExpr {
            left: Arc::new(self),
            op,
            right: Arc::new(right),
        })
    }

    pub fn equal(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Equal, right)
    }

    pub fn not_equal(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::NotEqual, right)
    }

    pub fn gt(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::GreaterThan, right)
    }

    pub fn ge(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::GreaterThanOrEqual, right)
    }

    pub fn lt(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::LessThan, right)
    }

    pub fn le(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::LessThanOrEqual, right)
    }

    pub fn and(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::And, right)
    }

    pub fn or(self, right: Expression) -> Expression {
        self.binary(BinaryOperator::Or, right)
    }

    /// Method call with `self` as receiver
    pub fn call(self, method: impl Into<String>, args: Vec<Expression>) -> Expression {
        Expression::MethodCall(MethodCallExpr {
            method: method.into(),
            source: Some(Arc::new(self)),
            args,
        })
    }

    /// Wrap in a scope exposing `bindings` by name to nested lambdas
    pub fn with_scope(self, bindings: IndexMap<String, Expression>) -> Expression {
        Expression::Scope(ScopeExpr {
            source: Arc::new(self),
            bindings,
        })
    }
}
