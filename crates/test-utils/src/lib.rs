// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Testing utilities for LINQ-SQL
//!
//! This crate provides common testing components including:
//! - A fluent [`Queryable`] chain that builds operator calls from lambda text
//! - SQL tree assertions
//! - Sample tables

pub mod assertions;
pub mod fixtures;
pub mod queryable;

// Re-exports for convenience
pub use assertions::SqlAssertions;
pub use fixtures::{admins, posts, users};
pub use queryable::Queryable;
