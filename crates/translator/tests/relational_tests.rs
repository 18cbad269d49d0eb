// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Joins, grouping, set operations and correlated subqueries

use linq_sql_ir::JoinKind;
use linq_sql_test_utils::{SqlAssertions, admins, posts, users};

#[test]
fn test_inner_join_with_result_selector() {
    let sql = users()
        .join(
            &posts(),
            "u => u.id",
            "p => p.authorId",
            Some("(u, p) => ({ name: u.name, title: p.title })"),
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.name AS name, p.title AS title FROM Users AS u \
         INNER JOIN Posts AS p ON (u.id = p.authorId)",
    );
    let select = SqlAssertions::expect_select(&sql);
    assert_eq!(select.joins.len(), 1);
    assert_eq!(select.joins[0].kind, JoinKind::Inner);
}

#[test]
fn test_left_join_without_result_selector() {
    let sql = users()
        .left_join(&posts(), "u => u.id", "p => p.authorId", None)
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.*, p.* FROM Users AS u LEFT JOIN Posts AS p ON (u.id = p.authorId)",
    );
    let select = SqlAssertions::expect_select(&sql);
    assert_eq!(SqlAssertions::projection_aliases(select), vec!["*", "p_all"]);
}

#[test]
fn test_member_on_several_stars_uses_the_first() {
    let sql = users()
        .left_join(&posts(), "u => u.id", "p => p.authorId", None)
        .where_("r => r.title == 'x'")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.*, p.* FROM Users AS u LEFT JOIN Posts AS p ON (u.id = p.authorId) \
         WHERE (u.title = 'x')",
    );
    let select = SqlAssertions::expect_select(&sql);
    match select.predicate.as_ref() {
        Some(linq_sql_ir::SqlExpression::Binary(b)) => {
            SqlAssertions::assert_column(&b.left, "u", "title");
        }
        other => panic!("Expected a binary predicate, found {:?}", other),
    }
}

#[test]
fn test_composite_join_keys() {
    let sql = users()
        .join(
            &posts(),
            "u => ({ id: u.id, dept: u.dept })",
            "p => ({ id: p.authorId, dept: p.dept })",
            Some("(u, p) => p.title"),
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT p.title AS title FROM Users AS u INNER JOIN Posts AS p \
         ON ((u.id = p.authorId) AND (u.dept = p.dept))",
    );
}

#[test]
fn test_composite_join_keys_must_pair() {
    let err = users()
        .join(&posts(), "u => ({ id: u.id, dept: u.dept })", "p => p.authorId", None)
        .translate()
        .unwrap_err();
    assert!(err.to_string().contains("join keys differ in size"));
}

#[test]
fn test_whole_row_projection_unwraps_downstream() {
    let sql = users()
        .join(
            &posts(),
            "u => u.id",
            "p => p.authorId",
            Some("(u, p) => ({ user: u, post: p })"),
        )
        .where_("r => r.post.views > 10")
        .select("r => ({ name: r.user.name, title: r.post.title })")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.name AS name, p.title AS title FROM Users AS u \
         INNER JOIN Posts AS p ON (u.id = p.authorId) WHERE (p.views > 10)",
    );
}

#[test]
fn test_join_against_filtered_query() {
    let recent = posts().where_("p => p.views > 100");
    let sql = users()
        .join(&recent, "u => u.id", "p => p.authorId", Some("(u, p) => ({ title: p.title })"))
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT p.title AS title FROM Users AS u INNER JOIN \
         (SELECT p.* FROM Posts AS p WHERE (p.views > 100)) AS p ON (u.id = p.authorId)",
    );
}

#[test]
fn test_group_by_with_result_selector() {
    let sql = users()
        .group_by("u => u.dept", Some("g => ({ dept: g.key, total: g.count() })"))
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.dept AS dept, COUNT(1) AS total FROM Users AS u GROUP BY u.dept",
    );
}

#[test]
fn test_group_by_without_result_selector() {
    let sql = users().group_by("u => u.dept", None).translate().unwrap();
    SqlAssertions::assert_text(&sql, "SELECT u.dept AS key FROM Users AS u GROUP BY u.dept");
}

#[test]
fn test_group_aggregates() {
    let sql = users()
        .group_by(
            "u => u.dept",
            Some(
                "g => ({ dept: g.key, adults: g.count(x => x.age >= 18), oldest: g.max(x => x.age) })",
            ),
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.dept AS dept, COUNT(CASE WHEN (u.age >= 18) THEN 1 END) AS adults, \
         MAX(u.age) AS oldest FROM Users AS u GROUP BY u.dept",
    );
}

#[test]
fn test_where_after_group_becomes_having() {
    let sql = users()
        .group_by("u => u.dept", Some("g => ({ dept: g.key, total: g.count() })"))
        .where_("g => g.total > 5")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.dept AS dept, COUNT(1) AS total FROM Users AS u \
         GROUP BY u.dept HAVING (COUNT(1) > 5)",
    );
    let select = SqlAssertions::expect_select(&sql);
    assert!(select.predicate.is_none());
}

#[test]
fn test_having_aggregate_over_joined_rows() {
    let grouped = users()
        .join(&posts(), "u => u.id", "p => p.authorId", Some("(u, p) => ({ u, p })"))
        .group_by(
            "r => r.u.dept",
            Some("(k, g) => ({ d: k, v: g.sum(r => r.p.views) })"),
        );
    let sql = grouped
        .where_("g => g.sum(r => r.p.views) > 10")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.dept AS d, SUM(p.views) AS v FROM Users AS u \
         INNER JOIN Posts AS p ON (u.id = p.authorId) GROUP BY u.dept \
         HAVING (SUM(p.views) > 10)",
    );
}

#[test]
fn test_composite_group_key() {
    let sql = users()
        .group_by(
            "u => ({ dept: u.dept, age: u.age })",
            Some("(key, g) => ({ dept: key.dept, age: g.key.age, n: g.count() })"),
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.dept AS dept, u.age AS age, COUNT(1) AS n FROM Users AS u \
         GROUP BY u.dept, u.age",
    );
}

#[test]
fn test_group_by_twice_is_rejected() {
    let err = users()
        .group_by("u => u.dept", None)
        .group_by("g => g.key", None)
        .translate()
        .unwrap_err();
    assert!(err.to_string().contains("already grouped"));
}

#[test]
fn test_union_assigns_one_alias() {
    let sql = users().union(&admins()).translate().unwrap();
    SqlAssertions::assert_text(
        &sql,
        "(SELECT u.* FROM Users AS u UNION SELECT a.* FROM Admins AS a) AS u1",
    );
    let union = SqlAssertions::expect_union(&sql);
    assert!(union.distinct);
    assert_eq!(union.alias(), Some("u1"));
}

#[test]
fn test_union_chain_flattens() {
    let sql = users()
        .union(&admins())
        .union(&users())
        .translate()
        .unwrap();
    let union = SqlAssertions::expect_union(&sql);
    assert_eq!(union.sources().len(), 3);
    SqlAssertions::assert_text(
        &sql,
        "(SELECT u.* FROM Users AS u UNION SELECT a.* FROM Admins AS a \
         UNION SELECT u1.* FROM Users AS u1) AS u2",
    );
}

#[test]
fn test_mixed_set_operations_nest() {
    let sql = users()
        .concat(&admins())
        .union(&posts())
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "(SELECT u1.* FROM (SELECT u.* FROM Users AS u UNION ALL SELECT a.* FROM Admins AS a) AS u1 \
         UNION SELECT p.* FROM Posts AS p) AS u2",
    );
}

#[test]
fn test_filter_over_union() {
    let sql = users()
        .union(&admins())
        .where_("x => x.name == 'a'")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u1.* FROM (SELECT u.* FROM Users AS u UNION SELECT a.* FROM Admins AS a) AS u1 \
         WHERE (u1.name = 'a')",
    );
}

#[test]
fn test_correlated_aggregate_subquery() {
    let sql = users()
        .with_scope([("posts", posts().build().unwrap())])
        .select(
            "u => ({ name: u.name, views: posts.where(p => p.authorId === u.id).sum(p => p.views) })",
        )
        .translate()
        .unwrap();

    let select = SqlAssertions::expect_select(&sql);
    let inner = SqlAssertions::expect_scalar_subquery(SqlAssertions::projected(select, "views"));
    assert_eq!(inner.from().to_string(), "Posts AS p");
    assert_eq!(SqlAssertions::projection_aliases(inner), vec!["sum_result"]);
    assert_eq!(
        inner.predicate.as_ref().unwrap().to_string(),
        "(p.authorId = u.id)"
    );
    // u.id resolves to the outer table
    let outer_id = match inner.predicate.as_ref() {
        Some(linq_sql_ir::SqlExpression::Binary(b)) => b.right.as_ref(),
        other => panic!("Expected a binary predicate, found {:?}", other),
    };
    let column = SqlAssertions::assert_column(outer_id, "u", "id");
    assert_eq!(column.table().name(), "Users");

    SqlAssertions::assert_text(
        &sql,
        "SELECT u.name AS name, (SELECT SUM(p.views) AS sum_result FROM Posts AS p \
         WHERE (p.authorId = u.id)) AS views FROM Users AS u",
    );
}

#[test]
fn test_collection_projection_is_json() {
    let sql = users()
        .with_scope([("posts", posts().build().unwrap())])
        .select("u => ({ name: u.name, posts: posts.where(p => p.authorId == u.id) })")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.name AS name, (SELECT p.* FROM Posts AS p WHERE (p.authorId = u.id) \
         FOR JSON PATH, INCLUDE_NULL_VALUES) AS posts FROM Users AS u",
    );
}

#[test]
fn test_nested_first_is_single_json_object() {
    let sql = users()
        .with_scope([("posts", posts().build().unwrap())])
        .select(
            "u => ({ latest: posts.where(p => p.authorId == u.id).orderByDescending(p => p.id).first() })",
        )
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT (SELECT p.* FROM Posts AS p WHERE (p.authorId = u.id) ORDER BY p.id DESC LIMIT 1 \
         FOR JSON PATH, INCLUDE_NULL_VALUES, WITHOUT_ARRAY_WRAPPER) AS latest FROM Users AS u",
    );
}

#[test]
fn test_exists_in_where() {
    let sql = users()
        .with_scope([("posts", posts().build().unwrap())])
        .where_("u => posts.any(p => p.authorId == u.id)")
        .translate()
        .unwrap();
    SqlAssertions::assert_text(
        &sql,
        "SELECT u.* FROM Users AS u WHERE EXISTS \
         (SELECT 1 AS exists_flag FROM Posts AS p WHERE (p.authorId = u.id))",
    );
}

#[test]
fn test_exists_without_predicate() {
    let sql = posts().exists(None).translate().unwrap();
    SqlAssertions::assert_text(&sql, "EXISTS (SELECT 1 AS exists_flag FROM Posts AS p)");
}
