// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Sample tables
//!
//! `Users(id, name, email, age, dept, createdAt)`,
//! `Posts(id, authorId, title, views)` and `Admins(id, name, email)`.
//! Column sets are informative only; translation never consults a schema.

use crate::queryable::Queryable;

pub fn users() -> Queryable {
    Queryable::table("Users")
}

pub fn posts() -> Queryable {
    Queryable::table("Posts")
}

pub fn admins() -> Queryable {
    Queryable::table("Admins")
}
