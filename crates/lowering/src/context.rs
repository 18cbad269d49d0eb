// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Lowering context for tracking state during conversion

use indexmap::IndexMap;
use linq_sql_expr::{Expression, ParameterExpr};
use tree_sitter::Node;

use crate::error::{LoweringError, LoweringResult};

/// Names bound by one lambda's parameter list
pub type ParameterScope = IndexMap<String, ParameterExpr>;

/// Default nesting limit for recursive lowering
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Context for tracking state during source → expression lowering
///
/// The context maintains:
/// - The source text the syntax tree was parsed from
/// - A stack of lambda parameter scopes, outermost first
/// - The optional external name → expression scope
/// - Recursion depth tracking
pub struct LoweringContext<'a> {
    source: &'a str,
    scopes: Vec<ParameterScope>,
    external: Option<&'a IndexMap<String, Expression>>,
    recursion_depth: usize,
    max_recursion_depth: usize,
}

impl<'a> LoweringContext<'a> {
    pub fn new(
        source: &'a str,
        scopes: Vec<ParameterScope>,
        external: Option<&'a IndexMap<String, Expression>>,
    ) -> Self {
        Self {
            source,
            scopes,
            external,
            recursion_depth: 0,
            max_recursion_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Source text of `node`
    pub fn text(&self, node: Node<'_>) -> LoweringResult<&'a str> {
        node.utf8_text(self.source.as_bytes())
            .map_err(|e| LoweringError::Parse {
                message: format!("invalid UTF-8: {}", e),
                fragment: String::new(),
            })
    }

    /// Source text of `node`, for error messages
    pub fn fragment(&self, node: Node<'_>) -> String {
        self.source
            .get(node.byte_range())
            .unwrap_or_default()
            .to_string()
    }

    pub fn push_scope(&mut self, scope: ParameterScope) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Resolve an identifier: innermost lambda scope first, then outer
    /// scopes, then the external scope
    pub fn resolve(&self, name: &str, node: Node<'_>) -> LoweringResult<Expression> {
        for scope in self.scopes.iter().rev() {
            if let Some(param) = scope.get(name) {
                return Ok(Expression::Parameter(param.clone()));
            }
        }
        if let Some(value) = self.external.and_then(|ext| ext.get(name)) {
            return Ok(value.clone());
        }
        Err(LoweringError::UnresolvedIdentifier {
            name: name.to_string(),
            visible: self.visible_names(),
            fragment: self.fragment(node),
        })
    }

    /// Every name currently resolvable, innermost scope first
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let lambda_names = self.scopes.iter().rev().flat_map(|s| s.keys());
        let external_names = self.external.into_iter().flat_map(|e| e.keys());
        for name in lambda_names.chain(external_names) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Increment recursion depth and check for overflow
    pub fn enter_recursive_context(&mut self) -> LoweringResult<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > self.max_recursion_depth {
            Err(LoweringError::RecursionLimitExceeded {
                context: "lambda lowering".to_string(),
                depth: self.recursion_depth,
                limit: self.max_recursion_depth,
            })
        } else {
            Ok(())
        }
    }

    /// Decrement recursion depth when exiting a recursive context
    pub fn exit_recursive_context(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursion_limit() {
        let mut ctx = LoweringContext::new("", Vec::new(), None);
        ctx.max_recursion_depth = 5;

        for _ in 0..5 {
            ctx.enter_recursive_context().unwrap();
        }
        assert!(matches!(
            ctx.enter_recursive_context(),
            Err(LoweringError::RecursionLimitExceeded { limit: 5, .. })
        ));

        ctx.exit_recursive_context();
        ctx.exit_recursive_context();
        assert_eq!(ctx.recursion_depth, 4);
    }

    #[test]
    fn test_visible_names_innermost_first() {
        let outer: ParameterScope = [("u".to_string(), ParameterExpr::new("u"))].into();
        let inner: ParameterScope = [("p".to_string(), ParameterExpr::new("p"))].into();
        let external: IndexMap<String, Expression> =
            [("posts".to_string(), linq_sql_expr::builder::table("Posts"))].into();

        let ctx = LoweringContext::new("", vec![outer, inner], Some(&external));
        assert_eq!(ctx.visible_names(), vec!["p", "u", "posts"]);
    }
}
