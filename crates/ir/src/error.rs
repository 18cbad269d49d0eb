// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Structural invariant errors raised while constructing SQL nodes

use serde::Serialize;

/// Result type alias for SQL node construction
pub type IrResult<T> = Result<T, StructuralError>;

/// A tree invariant violated at construction
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq, Serialize)]
pub enum StructuralError {
    /// Name of a table, column or function is empty
    #[error("{node} requires a non-empty name")]
    EmptyName { node: String },

    /// Alias of a table, select, union or projection is empty
    #[error("{node} requires a non-empty alias")]
    EmptyAlias { node: String },

    /// SELECT without any projection
    #[error("Select '{alias}' requires at least one projection")]
    EmptyProjection { alias: String },

    /// IN with an empty value list
    #[error("IN requires a non-empty list of constant values")]
    EmptyInList,

    /// CASE without any WHEN clause
    #[error("CASE requires at least one WHEN/THEN clause")]
    EmptyCase,

    /// UNION without any source
    #[error("UNION requires at least one source select")]
    EmptyUnion,

    /// FROM or JOIN target that is not a data source
    #[error("Expected a data source (Table, Select or Union), found {found}")]
    InvalidSource { found: String },

    /// Alias assigned to a node that already carries one
    #[error("Alias already assigned: '{existing}' cannot be replaced by '{requested}'")]
    AliasAlreadyAssigned { existing: String, requested: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StructuralError::EmptyProjection {
            alias: "u".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("at least one projection"));
        assert!(msg.contains("'u'"));

        let err = StructuralError::InvalidSource {
            found: "Column".to_string(),
        };
        assert!(err.to_string().contains("Column"));
    }

    #[test]
    fn test_error_serialization() {
        let err = StructuralError::EmptyName {
            node: "Table".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["EmptyName"]["node"], "Table");
    }
}
