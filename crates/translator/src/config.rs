// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Translator Configuration
//!
//! ## Example
//!
//! ```rust
//! use linq_sql_translator::TranslatorConfig;
//!
//! let config = TranslatorConfig::default().with_require_order_for_paging(true);
//! assert!(config.require_order_for_paging);
//!
//! let loaded = TranslatorConfig::from_json(r#"{ "max_depth": 32 }"#).unwrap();
//! assert_eq!(loaded.max_depth, 32);
//! assert!(loaded.json_include_nulls);
//! ```

use serde::{Deserialize, Serialize};

/// Translation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Reject `skip`/`take` that follow no `orderBy`; otherwise only warn
    pub require_order_for_paging: bool,

    /// Nesting limit for recursive translation
    pub max_depth: usize,

    /// INCLUDE_NULL_VALUES flag of generated JSON subqueries
    pub json_include_nulls: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            require_order_for_paging: false,
            max_depth: 100,
            json_include_nulls: true,
        }
    }
}

impl TranslatorConfig {
    /// Load from a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_require_order_for_paging(mut self, require: bool) -> Self {
        self.require_order_for_paging = require;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_json_include_nulls(mut self, include: bool) -> Self {
        self.json_include_nulls = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TranslatorConfig::default();
        assert!(!config.require_order_for_paging);
        assert_eq!(config.max_depth, 100);
        assert!(config.json_include_nulls);
    }

    #[test]
    fn test_from_json_rejects_wrong_types() {
        assert!(TranslatorConfig::from_json(r#"{ "max_depth": "deep" }"#).is_err());
        assert_eq!(
            TranslatorConfig::from_json("{}").unwrap(),
            TranslatorConfig::default()
        );
    }
}
