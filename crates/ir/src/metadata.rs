// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Metadata serialization
//!
//! Every node converts to a plain JSON structure carrying a `type`
//! discriminant plus the metadata of all children, recursively. Structural
//! tests assert against this form; it is deterministic because object keys are
//! emitted in sorted order.

use linq_sql_expr::Value;
use serde_json::{Value as Json, json};

use crate::expr::{
    BinaryExpr, CaseExpr, ColumnExpr, ConstantExpr, FunctionCallExpr, InExpr, LikeExpr,
    SqlExpression, TableExpr, WhenClause,
};
use crate::query::{
    ExistsExpr, JoinExpr, OrderByExpr, Projection, ScalarSubqueryAsJsonExpr, ScalarSubqueryExpr,
    SelectExpr, UnionExpr,
};

/// Conversion of a node into its metadata form
pub trait ToMetadata {
    fn to_metadata(&self) -> Json;
}

/// Plain JSON form of a scalar value
pub fn value_metadata(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => json!(b),
        Value::Integer(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::String(s) => json!(s),
        Value::Date(d) => json!(d.to_rfc3339()),
        Value::Array(values) => Json::Array(values.iter().map(value_metadata).collect()),
    }
}

fn list<T: ToMetadata>(items: &[T]) -> Json {
    Json::Array(items.iter().map(ToMetadata::to_metadata).collect())
}

fn optional<T: ToMetadata>(item: Option<&T>) -> Json {
    item.map(ToMetadata::to_metadata).unwrap_or(Json::Null)
}

impl ToMetadata for SqlExpression {
    fn to_metadata(&self) -> Json {
        match self {
            SqlExpression::Table(t) => t.to_metadata(),
            SqlExpression::Column(c) => c.to_metadata(),
            SqlExpression::Constant(c) => c.to_metadata(),
            SqlExpression::Select(s) => s.to_metadata(),
            SqlExpression::Binary(b) => b.to_metadata(),
            SqlExpression::Like(l) => l.to_metadata(),
            SqlExpression::In(i) => i.to_metadata(),
            SqlExpression::Case(c) => c.to_metadata(),
            SqlExpression::FunctionCall(f) => f.to_metadata(),
            SqlExpression::Exists(e) => e.to_metadata(),
            SqlExpression::ScalarSubquery(s) => s.to_metadata(),
            SqlExpression::ScalarSubqueryAsJson(s) => s.to_metadata(),
            SqlExpression::Union(u) => u.to_metadata(),
        }
    }
}

impl ToMetadata for TableExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "Table", "name": self.name(), "alias": self.alias() })
    }
}

impl ToMetadata for ColumnExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "Column", "name": self.name(), "table": self.table().to_metadata() })
    }
}

impl ToMetadata for ConstantExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "Constant",
            "value_kind": self.value.type_name(),
            "value": value_metadata(&self.value),
        })
    }
}

impl ToMetadata for BinaryExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "Binary",
            "left": self.left.to_metadata(),
            "op": self.op,
            "right": self.right.to_metadata(),
        })
    }
}

impl ToMetadata for LikeExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "Like", "source": self.source.to_metadata(), "pattern": self.pattern })
    }
}

impl ToMetadata for InExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "In",
            "expr": self.expr().to_metadata(),
            "values": self.values().iter().map(value_metadata).collect::<Vec<_>>(),
        })
    }
}

impl ToMetadata for WhenClause {
    fn to_metadata(&self) -> Json {
        json!({ "when": self.when.to_metadata(), "then": self.then.to_metadata() })
    }
}

impl ToMetadata for CaseExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "Case",
            "when_clauses": list(self.when_clauses()),
            "else": optional(self.else_result()),
        })
    }
}

impl ToMetadata for FunctionCallExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "FunctionCall", "name": self.name, "args": list(&self.args) })
    }
}

impl ToMetadata for Projection {
    fn to_metadata(&self) -> Json {
        json!({ "type": "Projection", "expr": self.expr().to_metadata(), "alias": self.alias() })
    }
}

impl ToMetadata for JoinExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": self.kind.node_name(),
            "table": self.table().to_metadata(),
            "predicate": self.predicate.to_metadata(),
        })
    }
}

impl ToMetadata for OrderByExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "OrderBy", "expr": self.expr.to_metadata(), "direction": self.direction })
    }
}

impl ToMetadata for SelectExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "Select",
            "alias": self.alias(),
            "projection": list(self.projection()),
            "from": self.from().to_metadata(),
            "predicate": optional(self.predicate.as_ref()),
            "having": optional(self.having.as_ref()),
            "joins": list(&self.joins),
            "order_by": list(&self.order_by),
            "offset": self.offset,
            "limit": self.limit,
            "group_by": list(&self.group_by),
        })
    }
}

impl ToMetadata for UnionExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "Union",
            "sources": list(self.sources()),
            "alias": self.alias(),
            "distinct": self.distinct,
        })
    }
}

impl ToMetadata for ExistsExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "Exists", "select": self.select.to_metadata() })
    }
}

impl ToMetadata for ScalarSubqueryExpr {
    fn to_metadata(&self) -> Json {
        json!({ "type": "ScalarSubquery", "select": self.select.to_metadata() })
    }
}

impl ToMetadata for ScalarSubqueryAsJsonExpr {
    fn to_metadata(&self) -> Json {
        json!({
            "type": "ScalarSubqueryAsJson",
            "select": self.select.to_metadata(),
            "mode": self.mode,
            "flags": self.flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SqlOperator;

    #[test]
    fn test_column_metadata_nests_table() {
        let table = TableExpr::new("Users", "u").unwrap();
        let column = ColumnExpr::new("age", table).unwrap();
        let meta = column.to_metadata();
        assert_eq!(meta["type"], "Column");
        assert_eq!(meta["name"], "age");
        assert_eq!(meta["table"]["type"], "Table");
        assert_eq!(meta["table"]["alias"], "u");
    }

    #[test]
    fn test_binary_metadata_names_operator() {
        let b = SqlExpression::binary(
            SqlExpression::constant(1),
            SqlOperator::LessThanOrEqual,
            SqlExpression::constant(2.5),
        );
        let meta = b.to_metadata();
        assert_eq!(meta["type"], "Binary");
        assert_eq!(meta["op"], "LessThanOrEqual");
        assert_eq!(meta["left"]["value"], 1);
        assert_eq!(meta["right"]["value_kind"], "float");
    }

    #[test]
    fn test_value_metadata_arrays() {
        let v = Value::from(vec![1, 2]);
        assert_eq!(value_metadata(&v), json!([1, 2]));
        assert_eq!(value_metadata(&Value::Null), Json::Null);
    }
}
