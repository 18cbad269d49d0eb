// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Host expression grammar front end
//!
//! Lambda source is parsed with the tree-sitter JavaScript grammar. The text
//! is wrapped in parentheses so that both `u => ...` and `function (u) {...}`
//! parse as a single expression statement.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{LoweringError, LoweringResult};

/// Node kinds of a function expression
pub const FUNCTION_KINDS: &[&str] = &["arrow_function", "function_expression", "function"];

/// Parsed lambda source
pub struct SourceTree {
    text: String,
    tree: Tree,
}

impl SourceTree {
    pub fn parse(source: &str) -> LoweringResult<Self> {
        let text = format!("({})", source.trim());

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| LoweringError::Parse {
                message: format!("grammar unavailable: {}", e),
                fragment: String::new(),
            })?;

        let tree = parser.parse(&text, None).ok_or_else(|| LoweringError::Parse {
            message: "parser produced no tree".to_string(),
            fragment: source.to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let fragment = first_error(root)
                .and_then(|n| text.get(n.byte_range()))
                .filter(|f| !f.is_empty())
                .unwrap_or(source)
                .to_string();
            return Err(LoweringError::Parse {
                message: "syntax error".to_string(),
                fragment,
            });
        }

        Ok(Self { text, tree })
    }

    /// Text the tree was parsed from, including the wrapping parentheses
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The outer anonymous function node
    pub fn function(&self) -> LoweringResult<Node<'_>> {
        let root = self.tree.root_node();
        let not_function = || LoweringError::Parse {
            message: "expected a function expression".to_string(),
            fragment: self.text[1..self.text.len() - 1].to_string(),
        };

        let mut statements = significant_children(root);
        let statement = statements.next().ok_or_else(not_function)?;
        if statements.next().is_some() || statement.kind() != "expression_statement" {
            return Err(not_function());
        }

        let mut node = significant_children(statement)
            .next()
            .ok_or_else(not_function)?;
        while node.kind() == "parenthesized_expression" {
            node = significant_children(node).next().ok_or_else(not_function)?;
        }

        if FUNCTION_KINDS.contains(&node.kind()) {
            Ok(node)
        } else {
            Err(not_function())
        }
    }
}

/// Named children, skipping comments
pub fn significant_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children.into_iter().filter(|n| n.kind() != "comment")
}

/// Depth-first search for the first error or missing node
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arrow_function() {
        let tree = SourceTree::parse("u => u.age > 30").unwrap();
        let function = tree.function().unwrap();
        assert_eq!(function.kind(), "arrow_function");
        assert!(function.child_by_field_name("parameter").is_some());
    }

    #[test]
    fn test_parse_function_expression() {
        let tree = SourceTree::parse("function (u) { return u.name; }").unwrap();
        let function = tree.function().unwrap();
        assert!(FUNCTION_KINDS.contains(&function.kind()));
    }

    #[test]
    fn test_syntax_error_reports_fragment() {
        let err = SourceTree::parse("u => u.age >").err().unwrap();
        assert!(matches!(err, LoweringError::Parse { .. }));
    }

    #[test]
    fn test_non_function_rejected() {
        let tree = SourceTree::parse("1 + 2").unwrap();
        assert!(matches!(
            tree.function(),
            Err(LoweringError::Parse { fragment, .. }) if fragment == "1 + 2"
        ));
    }
}
