// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Translation context
//!
//! Maps each lambda parameter, by identity, to the SQL data source it stands
//! for. Contexts form a parent chain: entering a lambda extends the current
//! context with that lambda's parameters, so a correlated inner lambda still
//! resolves the outer row. A context never changes once built.
//!
//! ## Example
//!
//! ```text
//! users.select(u => ({ views: posts.where(p => p.authorId === u.id).sum(p => p.views) }))
//!
//! root
//!  └─ { u → Select(Users AS u) }                select body
//!      └─ { p → Select(Posts AS p) }            where predicate: u still visible
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use linq_sql_expr::ParameterExpr;
use linq_sql_ir::{SelectExpr, SqlExpression};

use crate::error::{TranslationError, TranslationResult};

/// Name of the single group key
pub const GROUP_KEY: &str = "key";

/// What a parameter is bound to
#[derive(Debug, Clone)]
pub enum Binding {
    /// A table, select or union row
    Source(SqlExpression),
    /// The group placeholder of a grouped select
    Group(Arc<GroupBinding>),
}

/// Group placeholder: member access resolves against the GROUP BY keys
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBinding {
    keys: IndexMap<String, SqlExpression>,
    aggregates: IndexMap<String, SqlExpression>,
    row_source: SqlExpression,
}

impl GroupBinding {
    pub fn new(keys: IndexMap<String, SqlExpression>, row_source: SqlExpression) -> Self {
        Self {
            keys,
            aggregates: IndexMap::new(),
            row_source,
        }
    }

    /// Rebuild the placeholder of an already grouped select over `row_source`
    ///
    /// Keys take the alias of the projection that carries them; other
    /// projections stay reachable by alias.
    pub fn from_select(select: &SelectExpr, row_source: SqlExpression) -> Self {
        let single = select.group_by.len() == 1;
        let mut keys = IndexMap::new();
        for (i, term) in select.group_by.iter().enumerate() {
            let name = select
                .projection()
                .iter()
                .find(|p| p.expr() == term)
                .map(|p| p.alias().to_string())
                .unwrap_or_else(|| {
                    if single {
                        GROUP_KEY.to_string()
                    } else {
                        format!("{}{}", GROUP_KEY, i)
                    }
                });
            keys.insert(name, term.clone());
        }

        let aggregates = select
            .projection()
            .iter()
            .filter(|p| !select.group_by.contains(p.expr()))
            .map(|p| (p.alias().to_string(), p.expr().clone()))
            .collect();

        Self {
            keys,
            aggregates,
            row_source,
        }
    }

    pub fn keys(&self) -> &IndexMap<String, SqlExpression> {
        &self.keys
    }

    /// The key expression when the group has exactly one key
    pub fn single_key(&self) -> Option<&SqlExpression> {
        match self.keys.len() {
            1 => self.keys.values().next(),
            _ => None,
        }
    }

    pub fn key(&self, name: &str) -> Option<&SqlExpression> {
        self.keys.get(name)
    }

    /// Projected aggregate of the grouped select, by alias
    pub fn aggregate(&self, name: &str) -> Option<&SqlExpression> {
        self.aggregates.get(name)
    }

    /// Source that per-row lambdas inside the group resolve against
    pub fn row_source(&self) -> &SqlExpression {
        &self.row_source
    }
}

/// Parameter → source bindings with a parent chain
#[derive(Debug, Default)]
pub struct TranslationContext {
    frame: Vec<(ParameterExpr, Binding)>,
    parent: Option<Arc<TranslationContext>>,
    depth: usize,
}

impl TranslationContext {
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Child context with `bindings` on top of every binding of `self`
    pub fn extend(self: &Arc<Self>, bindings: Vec<(ParameterExpr, Binding)>) -> Arc<Self> {
        Arc::new(Self {
            frame: bindings,
            parent: Some(Arc::clone(self)),
            depth: self.depth + 1,
        })
    }

    pub fn resolve(&self, parameter: &ParameterExpr) -> Option<&Binding> {
        self.frame
            .iter()
            .rev()
            .find(|(p, _)| p.same_as(parameter))
            .map(|(_, b)| b)
            .or_else(|| self.parent.as_ref()?.resolve(parameter))
    }

    pub fn resolve_strict(&self, parameter: &ParameterExpr) -> TranslationResult<&Binding> {
        self.resolve(parameter)
            .ok_or_else(|| TranslationError::UnboundParameter {
                name: parameter.name().to_string(),
                bound: self.bound_names(),
            })
    }

    /// Names of every bound parameter, innermost first
    pub fn bound_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .frame
            .iter()
            .rev()
            .map(|(p, _)| p.name().to_string())
            .collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.bound_names());
        }
        names
    }

    /// Number of lambda scopes entered since the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether translation runs inside some lambda body
    pub fn is_nested(&self) -> bool {
        self.depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linq_sql_ir::TableExpr;

    fn table(name: &str, alias: &str) -> SqlExpression {
        SqlExpression::Table(TableExpr::new(name, alias).unwrap())
    }

    #[test]
    fn test_resolve_by_identity() {
        let u = ParameterExpr::new("u");
        let other_u = ParameterExpr::new("u");
        let root = TranslationContext::root();
        let ctx = root.extend(vec![(u.clone(), Binding::Source(table("Users", "u")))]);

        assert!(ctx.resolve(&u).is_some());
        assert!(ctx.resolve(&other_u).is_none());
        assert!(matches!(
            ctx.resolve_strict(&other_u),
            Err(TranslationError::UnboundParameter { bound, .. }) if bound == vec!["u"]
        ));
    }

    #[test]
    fn test_extend_keeps_parent_untouched() {
        let u = ParameterExpr::new("u");
        let p = ParameterExpr::new("p");
        let outer = TranslationContext::root()
            .extend(vec![(u.clone(), Binding::Source(table("Users", "u")))]);
        let inner = outer.extend(vec![(p.clone(), Binding::Source(table("Posts", "p")))]);

        assert!(inner.resolve(&u).is_some());
        assert!(inner.resolve(&p).is_some());
        assert!(outer.resolve(&p).is_none());
        assert_eq!(inner.bound_names(), vec!["p", "u"]);
        assert_eq!(inner.depth(), 2);
        assert!(!TranslationContext::root().is_nested());
    }

    #[test]
    fn test_group_from_select_names_keys_by_projection() {
        use linq_sql_ir::{ColumnExpr, Projection};

        let users = TableExpr::new("Users", "u").unwrap();
        let dept = SqlExpression::Column(ColumnExpr::new("dept", users.clone()).unwrap());
        let count = SqlExpression::function("COUNT", vec![SqlExpression::constant(1)]);
        let mut select = SelectExpr::new(
            "u",
            vec![
                Projection::new(dept.clone(), "department").unwrap(),
                Projection::new(count.clone(), "total").unwrap(),
            ],
            SqlExpression::Table(users),
        )
        .unwrap();
        select.group_by.push(dept.clone());

        let group = GroupBinding::from_select(&select, select.from().clone());
        assert_eq!(group.key("department"), Some(&dept));
        assert_eq!(group.single_key(), Some(&dept));
        assert_eq!(group.aggregate("total"), Some(&count));
        assert!(group.aggregate("department").is_none());
        assert_eq!(group.row_source(), select.from());
    }
}
