// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Fluent operator chain
//!
//! Each operator takes its lambdas as source text, lowers them against the
//! names exposed through [`Queryable::with_scope`] and appends a method call
//! node. A lowering failure is kept and reported by [`Queryable::translate`],
//! so a chain can be written without intermediate `?`.
//!
//! ```rust
//! use linq_sql_test_utils::Queryable;
//!
//! let sql = Queryable::table("Users")
//!     .where_("u => u.age > 30")
//!     .select("u => u.email")
//!     .translate()
//!     .unwrap();
//! assert_eq!(sql.to_string(), "SELECT u.email AS email FROM Users AS u WHERE (u.age > 30)");
//! ```

use indexmap::IndexMap;
use linq_sql_expr::Expression;
use linq_sql_expr::builder::table;
use linq_sql_ir::SqlExpression;
use linq_sql_lowering::{LoweringError, lower_lambda};
use linq_sql_translator::{QueryTranslator, TranslationError, TranslationResult};

/// Operator chain over one query source
#[derive(Debug, Clone)]
pub struct Queryable {
    expr: Expression,
    external: IndexMap<String, Expression>,
    error: Option<LoweringError>,
}

impl Queryable {
    /// Chain rooted at a named table
    pub fn table(name: impl Into<String>) -> Self {
        Self::from_expression(table(name))
    }

    pub fn from_expression(expr: Expression) -> Self {
        Self {
            expr,
            external: IndexMap::new(),
            error: None,
        }
    }

    /// Expose values or other queries by name to every later lambda
    pub fn with_scope<K: Into<String>>(
        mut self,
        bindings: impl IntoIterator<Item = (K, Expression)>,
    ) -> Self {
        let bindings: IndexMap<String, Expression> =
            bindings.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.external
            .extend(bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.expr = self.expr.with_scope(bindings);
        self
    }

    /// The query expression built so far
    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// The query expression, or the first lowering error of the chain
    pub fn build(self) -> Result<Expression, LoweringError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.expr),
        }
    }

    pub fn translate(&self) -> TranslationResult<SqlExpression> {
        self.translate_with(&QueryTranslator::new())
    }

    pub fn translate_with(&self, translator: &QueryTranslator) -> TranslationResult<SqlExpression> {
        match &self.error {
            Some(error) => Err(TranslationError::from(error.clone())),
            None => translator.translate(&self.expr),
        }
    }

    fn lambda(&self, source: &str) -> Result<Expression, LoweringError> {
        lower_lambda(source, &[], Some(&self.external)).map(Expression::Lambda)
    }

    fn lambdas(&self, sources: &[&str]) -> Result<Vec<Expression>, LoweringError> {
        sources.iter().map(|source| self.lambda(source)).collect()
    }

    fn call(mut self, method: &str, args: Result<Vec<Expression>, LoweringError>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match args {
            Ok(args) => self.expr = self.expr.call(method, args),
            Err(error) => self.error = Some(error),
        }
        self
    }

    fn with_lambdas(self, method: &str, sources: &[&str]) -> Self {
        let args = self.lambdas(sources);
        self.call(method, args)
    }

    fn with_optional(self, method: &str, source: Option<&str>) -> Self {
        let sources: Vec<&str> = source.into_iter().collect();
        self.with_lambdas(method, &sources)
    }

    pub fn where_(self, predicate: &str) -> Self {
        self.with_lambdas("where", &[predicate])
    }

    pub fn select(self, selector: &str) -> Self {
        self.with_lambdas("select", &[selector])
    }

    pub fn join(
        self,
        inner: &Queryable,
        outer_key: &str,
        inner_key: &str,
        result: Option<&str>,
    ) -> Self {
        self.join_call("join", inner, outer_key, inner_key, result)
    }

    pub fn left_join(
        self,
        inner: &Queryable,
        outer_key: &str,
        inner_key: &str,
        result: Option<&str>,
    ) -> Self {
        self.join_call("leftJoin", inner, outer_key, inner_key, result)
    }

    fn join_call(
        mut self,
        method: &str,
        inner: &Queryable,
        outer_key: &str,
        inner_key: &str,
        result: Option<&str>,
    ) -> Self {
        if let Some(error) = &inner.error {
            self.error.get_or_insert_with(|| error.clone());
            return self;
        }
        let mut sources = vec![outer_key, inner_key];
        sources.extend(result);
        let args = self.lambdas(&sources).map(|lambdas| {
            std::iter::once(inner.expr.clone())
                .chain(lambdas)
                .collect::<Vec<_>>()
        });
        self.call(method, args)
    }

    pub fn group_by(self, key: &str, result: Option<&str>) -> Self {
        let mut sources = vec![key];
        sources.extend(result);
        self.with_lambdas("groupBy", &sources)
    }

    pub fn order_by(self, key: &str) -> Self {
        self.with_lambdas("orderBy", &[key])
    }

    pub fn order_by_descending(self, key: &str) -> Self {
        self.with_lambdas("orderByDescending", &[key])
    }

    pub fn then_by(self, key: &str) -> Self {
        self.with_lambdas("thenBy", &[key])
    }

    pub fn then_by_descending(self, key: &str) -> Self {
        self.with_lambdas("thenByDescending", &[key])
    }

    pub fn skip(self, count: i64) -> Self {
        self.call("skip", Ok(vec![Expression::Literal(count.into())]))
    }

    pub fn take(self, count: i64) -> Self {
        self.call("take", Ok(vec![Expression::Literal(count.into())]))
    }

    pub fn count(self) -> Self {
        self.call("count", Ok(Vec::new()))
    }

    pub fn count_where(self, predicate: &str) -> Self {
        self.with_lambdas("count", &[predicate])
    }

    pub fn sum(self, selector: &str) -> Self {
        self.with_lambdas("sum", &[selector])
    }

    pub fn avg(self, selector: &str) -> Self {
        self.with_lambdas("avg", &[selector])
    }

    pub fn min(self, selector: &str) -> Self {
        self.with_lambdas("min", &[selector])
    }

    pub fn max(self, selector: &str) -> Self {
        self.with_lambdas("max", &[selector])
    }

    pub fn union(self, other: &Queryable) -> Self {
        self.set_call("union", other)
    }

    pub fn concat(self, other: &Queryable) -> Self {
        self.set_call("concat", other)
    }

    fn set_call(mut self, method: &str, other: &Queryable) -> Self {
        if let Some(error) = &other.error {
            self.error.get_or_insert_with(|| error.clone());
            return self;
        }
        self.call(method, Ok(vec![other.expr.clone()]))
    }

    pub fn any(self, predicate: Option<&str>) -> Self {
        self.with_optional("any", predicate)
    }

    pub fn exists(self, predicate: Option<&str>) -> Self {
        self.with_optional("exists", predicate)
    }

    pub fn first(self, predicate: Option<&str>) -> Self {
        self.with_optional("first", predicate)
    }

    pub fn first_or_default(self, predicate: Option<&str>) -> Self {
        self.with_optional("firstOrDefault", predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linq_sql_translator::ErrorKind;

    #[test]
    fn test_chain_builds_method_calls() {
        let expr = Queryable::table("Users")
            .where_("u => u.age > 30")
            .take(5)
            .build()
            .unwrap();
        match expr {
            Expression::MethodCall(call) => {
                assert_eq!(call.method, "take");
                assert!(matches!(
                    call.source.as_deref(),
                    Some(Expression::MethodCall(inner)) if inner.method == "where"
                ));
            }
            other => panic!("Expected a method call, found {:?}", other),
        }
    }

    #[test]
    fn test_lowering_error_is_deferred() {
        let query = Queryable::table("Users")
            .where_("u => u[0]")
            .select("u => u.name");
        let err = query.translate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(query.build().is_err());
    }
}
