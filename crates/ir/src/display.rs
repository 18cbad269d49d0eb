// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Debug text form of SQL nodes
//!
//! This is a human-readable dump for logs and test failure messages. It is not
//! rendered SQL: identifiers are never quoted and no dialect rules apply.

use std::fmt;

use crate::expr::SqlExpression;
use crate::query::{JoinExpr, JsonMode, Projection, SelectExpr, SortDirection, UnionExpr};

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// FROM / JOIN target: tables by name, everything else parenthesized
fn write_source(f: &mut fmt::Formatter<'_>, source: &SqlExpression) -> fmt::Result {
    match source {
        SqlExpression::Table(t) => write!(f, "{} AS {}", t.name(), t.alias()),
        SqlExpression::Select(s) => write!(f, "({}) AS {}", s, s.alias()),
        SqlExpression::Union(u) => write!(f, "{}", u),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for SqlExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlExpression::Table(t) => write!(f, "{} AS {}", t.name(), t.alias()),
            SqlExpression::Column(c) => write!(f, "{}.{}", c.table().alias(), c.name()),
            SqlExpression::Constant(c) => write!(f, "{}", c.value),
            SqlExpression::Select(s) => write!(f, "{}", s),
            SqlExpression::Binary(b) => write!(f, "({} {} {})", b.left, b.op.symbol(), b.right),
            SqlExpression::Like(l) => write!(f, "{} LIKE '{}'", l.source, l.pattern),
            SqlExpression::In(i) => {
                write!(f, "{} IN (", i.expr())?;
                write_list(f, i.values())?;
                write!(f, ")")
            }
            SqlExpression::Case(c) => {
                write!(f, "CASE")?;
                for clause in c.when_clauses() {
                    write!(f, " WHEN {} THEN {}", clause.when, clause.then)?;
                }
                if let Some(e) = c.else_result() {
                    write!(f, " ELSE {}", e)?;
                }
                write!(f, " END")
            }
            SqlExpression::FunctionCall(func) => {
                write!(f, "{}(", func.name)?;
                write_list(f, &func.args)?;
                write!(f, ")")
            }
            SqlExpression::Exists(e) => write!(f, "EXISTS ({})", e.select),
            SqlExpression::ScalarSubquery(s) => write!(f, "({})", s.select),
            SqlExpression::ScalarSubqueryAsJson(s) => {
                let mode = match s.mode {
                    JsonMode::Path => "PATH",
                    JsonMode::Auto => "AUTO",
                };
                write!(f, "({} FOR JSON {}", s.select, mode)?;
                if s.flags.include_null_values {
                    write!(f, ", INCLUDE_NULL_VALUES")?;
                }
                if s.flags.without_array_wrapper {
                    write!(f, ", WITHOUT_ARRAY_WRAPPER")?;
                }
                write!(f, ")")
            }
            SqlExpression::Union(u) => write!(f, "{}", u),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.star_column() {
            Some(c) => write!(f, "{}.*", c.table().alias()),
            None => write!(f, "{} AS {}", self.expr(), self.alias()),
        }
    }
}

impl fmt::Display for JoinExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.kind {
            crate::query::JoinKind::Inner => "INNER JOIN",
            crate::query::JoinKind::Left => "LEFT JOIN",
        };
        write!(f, "{} ", keyword)?;
        write_source(f, self.table())?;
        write!(f, " ON {}", self.predicate)
    }
}

impl fmt::Display for SelectExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        write_list(f, self.projection())?;
        write!(f, " FROM ")?;
        write_source(f, self.from())?;
        for join in &self.joins {
            write!(f, " {}", join)?;
        }
        if let Some(p) = &self.predicate {
            write!(f, " WHERE {}", p)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {}", h)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, term) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                let dir = match term.direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                write!(f, "{} {}", term.expr, dir)?;
            }
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

impl fmt::Display for UnionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.distinct { " UNION " } else { " UNION ALL " };
        write!(f, "(")?;
        for (i, select) in self.sources().iter().enumerate() {
            if i > 0 {
                write!(f, "{}", keyword)?;
            }
            write!(f, "{}", select)?;
        }
        write!(f, ") AS {}", self.alias().unwrap_or("?"))
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{ColumnExpr, SqlExpression, SqlOperator, TableExpr};
    use crate::query::{Projection, SelectExpr};

    #[test]
    fn test_select_debug_text() {
        let users = TableExpr::new("Users", "u").unwrap();
        let email = ColumnExpr::new("email", users.clone()).unwrap();
        let age = ColumnExpr::new("age", users.clone()).unwrap();

        let mut select = SelectExpr::new(
            "u",
            vec![Projection::new(SqlExpression::Column(email), "email").unwrap()],
            SqlExpression::Table(users),
        )
        .unwrap();
        select.and_where(SqlExpression::binary(
            SqlExpression::Column(age),
            SqlOperator::GreaterThan,
            SqlExpression::constant(30),
        ));
        select.limit = Some(10);

        assert_eq!(
            select.to_string(),
            "SELECT u.email AS email FROM Users AS u WHERE (u.age > 30) LIMIT 10"
        );
    }
}
