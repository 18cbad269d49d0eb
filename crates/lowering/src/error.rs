// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for the lowering layer
//!
//! Every variant carries the offending source fragment (or the names involved)
//! so a failure can be traced back to the lambda text that caused it.

use serde::Serialize;

/// Result type alias for lowering operations
pub type LoweringResult<T> = Result<T, LoweringError>;

/// Errors that can occur during lambda source → expression lowering
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq, Serialize)]
pub enum LoweringError {
    /// Source text is not a parsable function expression
    #[error("Parse error: {message} in `{fragment}`")]
    Parse { message: String, fragment: String },

    /// Syntax the expression model has no counterpart for
    #[error("Unsupported syntax: {feature} in `{fragment}`")]
    UnsupportedSyntax { feature: String, fragment: String },

    /// The syntax node is missing a required child
    #[error("Missing required child node: expected '{expected}', but not found in `{context}`")]
    MissingChild { context: String, expected: String },

    /// Invalid literal value
    #[error("Invalid literal value: {value} cannot be parsed as {type_name}")]
    InvalidLiteral { value: String, type_name: String },

    /// Identifier bound by no enclosing lambda and no external scope
    #[error("Unresolved identifier '{name}' in `{fragment}`; visible names: [{}]", visible.join(", "))]
    UnresolvedIdentifier {
        name: String,
        visible: Vec<String>,
        fragment: String,
    },

    /// Nesting deeper than the configured limit
    #[error("Recursion limit exceeded: {context} (depth: {depth}, limit: {limit})")]
    RecursionLimitExceeded {
        context: String,
        depth: usize,
        limit: usize,
    },
}

impl LoweringError {
    /// Whether this is a name-resolution failure rather than a syntax one
    pub fn is_resolution(&self) -> bool {
        matches!(self, LoweringError::UnresolvedIdentifier { .. })
    }

    pub(crate) fn unsupported(feature: impl Into<String>, fragment: &str) -> Self {
        LoweringError::UnsupportedSyntax {
            feature: feature.into(),
            fragment: fragment.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unresolved() {
        let err = LoweringError::UnresolvedIdentifier {
            name: "y".to_string(),
            visible: vec!["u".to_string(), "posts".to_string()],
            fragment: "y.id".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("'y'"));
        assert!(msg.contains("[u, posts]"));
        assert!(err.is_resolution());
    }

    #[test]
    fn test_error_display_unsupported_syntax() {
        let err = LoweringError::unsupported("computed member access", "u['name']");
        let msg = format!("{}", err);
        assert!(msg.contains("computed member access"));
        assert!(msg.contains("u['name']"));
        assert!(!err.is_resolution());
    }

    #[test]
    fn test_error_serialization() {
        let err = LoweringError::InvalidLiteral {
            value: "1e999".to_string(),
            type_name: "number".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["InvalidLiteral"]["value"], "1e999");
    }
}
