// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types for translation
//!
//! Translation is fail-fast: the first construct that cannot be lowered aborts
//! the whole call and no partial tree is returned.

use linq_sql_ir::StructuralError;
use linq_sql_lowering::LoweringError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for translation operations
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Lambda source unparsable or outside the supported syntax
    Parse,
    /// Identifier or parameter bound nowhere
    Resolution,
    /// Node that cannot be lowered to SQL
    Translation,
    /// SQL tree invariant violated at construction
    StructuralInvariant,
}

/// Errors that can occur while translating a query expression
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum TranslationError {
    /// Lambda source lowering failed
    #[error(transparent)]
    Lowering(#[from] LoweringError),

    /// A SQL node rejected its construction arguments
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Parameter not bound in the current context or any parent
    #[error("Unbound parameter '{name}'; bound parameters: [{}]", bound.join(", "))]
    UnboundParameter { name: String, bound: Vec<String> },

    /// Method name with no registered operator
    #[error("Unsupported method '{method}'")]
    UnsupportedMethod { method: String },

    /// Operator called with an argument count outside its accepted range
    #[error("Method '{method}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        method: String,
        expected: String,
        found: usize,
    },

    /// Argument that must be a constant is not one
    #[error("Argument {position} of '{method}' must be {expected}")]
    NonConstantArgument {
        method: String,
        position: usize,
        expected: String,
    },

    /// `includes` over an empty array (empty IN is not representable)
    #[error("'includes' over an empty array cannot be represented as IN")]
    EmptyInList,

    /// Required sub-expression is absent
    #[error("Missing {what} in '{context}'")]
    MissingExpression { context: String, what: String },

    /// Node shape with no SQL lowering
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// Paging without a preceding ordering, when ordering is required
    #[error("'{method}' requires a preceding orderBy")]
    PagingWithoutOrdering { method: String },

    /// Query nesting deeper than the configured limit
    #[error("Recursion limit exceeded (depth: {depth}, limit: {limit})")]
    RecursionLimitExceeded { depth: usize, limit: usize },
}

impl TranslationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::Lowering(e) if e.is_resolution() => ErrorKind::Resolution,
            TranslationError::Lowering(_) => ErrorKind::Parse,
            TranslationError::UnboundParameter { .. } => ErrorKind::Resolution,
            TranslationError::Structural(_) => ErrorKind::StructuralInvariant,
            _ => ErrorKind::Translation,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        TranslationError::Unsupported {
            message: message.into(),
        }
    }

    pub(crate) fn missing(context: impl Into<String>, what: impl Into<String>) -> Self {
        TranslationError::MissingExpression {
            context: context.into(),
            what: what.into(),
        }
    }
}
