// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Table and subquery alias issuance
//!
//! Aliases are the lowercased first letter of the source name, numeric
//! suffixed on collision: `Users` → `u`, a second `Users` → `u1`, `Uploads`
//! → `u2`. One generator serves a whole top-level translation, so every
//! alias in one generated statement is distinct.

use std::collections::HashSet;

use tracing::debug;

/// Base used when the source name has no ASCII letter
const FALLBACK_BASE: &str = "t";

#[derive(Debug, Default, Clone)]
pub struct AliasGenerator {
    used: HashSet<String>,
    issued: Vec<String>,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh alias derived from `source_name`
    pub fn issue(&mut self, source_name: &str) -> String {
        let base = source_name
            .chars()
            .find(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase().to_string())
            .unwrap_or_else(|| FALLBACK_BASE.to_string());

        let mut alias = base.clone();
        let mut suffix = 1;
        while self.used.contains(&alias) {
            alias = format!("{}{}", base, suffix);
            suffix += 1;
        }

        debug!(source = source_name, alias = %alias, "issued alias");
        self.used.insert(alias.clone());
        self.issued.push(alias.clone());
        alias
    }

    /// Aliases in issue order
    pub fn issued(&self) -> &[String] {
        &self.issued
    }
}
