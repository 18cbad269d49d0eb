// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query expression visitor
//!
//! [`QueryTranslator`] is the translation entry point. Each call to
//! [`QueryTranslator::translate`] runs a fresh [`QueryVisitor`], which owns
//! the alias generator for that call, so independent translations never
//! share mutable state.
//!
//! The visitor dispatches by node kind. Fundamental nodes (parameters,
//! constants, member access, binary operations) are handled here; method
//! calls go through the [`OperatorRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use linq_sql_expr::{
    BinaryOperator, ConstantValue, Expression, LambdaExpr, MemberAccessExpr, MethodCallExpr,
    ParameterExpr,
};
use linq_sql_ir::{
    ColumnExpr, Projection, STAR, SelectExpr, SqlExpression, SqlOperator, TableExpr, UnionExpr,
    WHOLE_ROW_SUFFIX,
};
use tracing::{debug, instrument, warn};

use crate::alias::AliasGenerator;
use crate::config::TranslatorConfig;
use crate::context::{Binding, GROUP_KEY, GroupBinding, TranslationContext};
use crate::error::{TranslationError, TranslationResult};
use crate::registry::OperatorRegistry;

/// Alias base for unions
const UNION_ALIAS_BASE: &str = "union";

/// Query expression → SQL expression translator
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    config: TranslatorConfig,
    registry: Arc<OperatorRegistry>,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTranslator {
    /// Translator with default configuration and the standard operators
    pub fn new() -> Self {
        Self::with_config(TranslatorConfig::default())
    }

    pub fn with_config(config: TranslatorConfig) -> Self {
        Self {
            config,
            registry: OperatorRegistry::shared(),
        }
    }

    /// Replace the operator registry
    pub fn with_registry(mut self, registry: OperatorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Translate a query expression into one SQL expression tree
    #[instrument(skip_all, fields(root = expr.kind_name()))]
    pub fn translate(&self, expr: &Expression) -> TranslationResult<SqlExpression> {
        let mut visitor = QueryVisitor::new(&self.config, &self.registry);
        let result = visitor.visit(expr, &TranslationContext::root())?;
        let result = visitor.finish(result)?;
        debug!(aliases = ?visitor.aliases.issued(), kind = result.kind(), "translated query");
        Ok(result)
    }
}

/// State of one top-level translation
pub struct QueryVisitor<'t> {
    config: &'t TranslatorConfig,
    registry: &'t OperatorRegistry,
    aliases: AliasGenerator,
    depth: usize,
    /// Ungrouped rows of each grouped select, by select alias
    group_rows: HashMap<String, SqlExpression>,
}

impl<'t> QueryVisitor<'t> {
    pub fn new(config: &'t TranslatorConfig, registry: &'t OperatorRegistry) -> Self {
        Self {
            config,
            registry,
            aliases: AliasGenerator::new(),
            depth: 0,
            group_rows: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        self.config
    }

    /// Alias of `union`, issued and assigned on first use
    pub fn union_alias(&mut self, union: &mut UnionExpr) -> TranslationResult<String> {
        if let Some(alias) = union.alias() {
            return Ok(alias.to_string());
        }
        let alias = self.aliases.issue(UNION_ALIAS_BASE);
        union.assign_alias(alias.clone())?;
        Ok(alias)
    }

    /// Assign the alias of a root union that was never used as a source
    fn finish(&mut self, result: SqlExpression) -> TranslationResult<SqlExpression> {
        match result {
            SqlExpression::Union(mut union) => {
                self.union_alias(&mut union)?;
                Ok(SqlExpression::Union(union))
            }
            other => Ok(other),
        }
    }

    /// Translate one node under `ctx`
    pub fn visit(
        &mut self,
        expr: &Expression,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            let depth = self.depth;
            self.depth -= 1;
            return Err(TranslationError::RecursionLimitExceeded {
                depth,
                limit: self.config.max_depth,
            });
        }
        let result = self.visit_node(expr, ctx);
        self.depth -= 1;
        result
    }

    fn visit_node(
        &mut self,
        expr: &Expression,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        match expr {
            Expression::Parameter(p) => self.visit_parameter(p, ctx),
            Expression::Constant(ConstantValue::Table(marker)) => {
                let alias = self.aliases.issue(&marker.name);
                Ok(SqlExpression::Table(TableExpr::new(marker.name.clone(), alias)?))
            }
            Expression::Constant(ConstantValue::Value(v)) | Expression::Literal(v) => {
                Ok(SqlExpression::constant(v.clone()))
            }
            // Scopes only affect identifier resolution during lowering
            Expression::Scope(scope) => self.visit(&scope.source, ctx),
            Expression::MemberAccess(access) => self.visit_member(access, ctx),
            Expression::Binary(binary) => {
                let left = self.visit(&binary.left, ctx)?;
                let right = self.visit(&binary.right, ctx)?;
                Ok(binary_expression(left, sql_operator(binary.op), right))
            }
            Expression::MethodCall(call) => self.visit_method_call(call, ctx),
            Expression::Lambda(_) => Err(TranslationError::unsupported(
                "lambda outside an operator argument",
            )),
            Expression::NewObject(_) => Err(TranslationError::unsupported(
                "object literal outside a projection",
            )),
        }
    }

    fn visit_parameter(
        &mut self,
        parameter: &ParameterExpr,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        match ctx.resolve_strict(parameter)? {
            Binding::Source(sql) => Ok(sql.clone()),
            Binding::Group(group) => group.single_key().cloned().ok_or_else(|| {
                TranslationError::unsupported(format!(
                    "group '{}' used as a value; access one of its keys: {}",
                    parameter.name(),
                    group.keys().keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            }),
        }
    }

    fn visit_method_call(
        &mut self,
        call: &MethodCallExpr,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        let spec = self.registry.get(&call.method).cloned().ok_or_else(|| {
            TranslationError::UnsupportedMethod {
                method: call.method.clone(),
            }
        })?;
        spec.check_arity(call)?;
        debug!(method = %call.method, args = call.args.len(), "dispatching operator");
        (spec.handler)(self, call, ctx)
    }

    /// Group placeholder that `expr` resolves to, if any
    pub fn group_of(
        &self,
        expr: &Expression,
        ctx: &TranslationContext,
    ) -> Option<Arc<GroupBinding>> {
        let parameter = expr.as_parameter()?;
        match ctx.resolve(parameter)? {
            Binding::Group(group) => Some(Arc::clone(group)),
            Binding::Source(_) => None,
        }
    }

    fn visit_member(
        &mut self,
        access: &MemberAccessExpr,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        let member = access.member.as_str();

        if let Some(group) = self.group_of(&access.object, ctx) {
            return group_member(&group, member);
        }
        // `g.key.x` on a composite key
        if let Expression::MemberAccess(inner) = access.object.as_ref()
            && inner.member == GROUP_KEY
            && let Some(group) = self.group_of(&inner.object, ctx)
            && group.single_key().is_none()
        {
            return group.key(member).cloned().ok_or_else(|| {
                TranslationError::unsupported(format!("group has no key named '{}'", member))
            });
        }

        match self.visit(&access.object, ctx)? {
            SqlExpression::Table(table) => Ok(SqlExpression::Column(ColumnExpr::new(member, table)?)),
            SqlExpression::Select(select) => select_member(&select, member),
            SqlExpression::Union(union) => {
                let alias = union
                    .alias()
                    .ok_or_else(|| TranslationError::missing(member, "union alias"))?;
                let table = TableExpr::new(alias, alias)?;
                Ok(SqlExpression::Column(ColumnExpr::new(member, table)?))
            }
            scalar => scalar_member(scalar, member),
        }
    }

    /// Translate a lambda body with its parameters bound positionally
    pub fn visit_lambda(
        &mut self,
        lambda: &LambdaExpr,
        bindings: Vec<Binding>,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SqlExpression> {
        let inner = bind_lambda(lambda, bindings, ctx)?;
        self.visit(&lambda.body, &inner)
    }

    /// Coerce a data source into a select over it
    ///
    /// A table becomes `SELECT alias.* FROM table AS alias`; a union is
    /// aliased (once) and wrapped the same way.
    pub fn as_select(&mut self, source: SqlExpression) -> TranslationResult<SelectExpr> {
        match source {
            SqlExpression::Select(select) => Ok(*select),
            SqlExpression::Table(table) => {
                let star = Projection::star(ColumnExpr::star(table.clone()), STAR)?;
                Ok(SelectExpr::new(
                    table.alias().to_string(),
                    vec![star],
                    SqlExpression::Table(table),
                )?)
            }
            SqlExpression::Union(mut union) => {
                let alias = self.union_alias(&mut union)?;
                let table = TableExpr::new(alias.clone(), alias.clone())?;
                let star = Projection::star(ColumnExpr::star(table), STAR)?;
                Ok(SelectExpr::new(alias, vec![star], SqlExpression::Union(union))?)
            }
            other => Err(TranslationError::unsupported(format!(
                "{} is not a query source",
                other.kind()
            ))),
        }
    }

    /// Translate the receiver of `call` into a select
    pub fn source_select(
        &mut self,
        call: &MethodCallExpr,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SelectExpr> {
        let source = source_of(call)?;
        let sql = self.visit(source, ctx)?;
        self.as_select(sql)
    }

    /// Receiver of `call` as a select whose rows later clauses may filter,
    /// sort, group or aggregate
    ///
    /// A paged receiver is wrapped as a derived table first, so the new
    /// clause applies to the rows left after OFFSET/LIMIT.
    pub fn unpaged_source(
        &mut self,
        call: &MethodCallExpr,
        ctx: &Arc<TranslationContext>,
    ) -> TranslationResult<SelectExpr> {
        let select = self.source_select(call, ctx)?;
        if select.is_paged() {
            derived_table(select)
        } else {
            Ok(select)
        }
    }

    /// Keep the ungrouped rows of the grouped select `alias` for later
    /// aggregates over its groups
    pub fn record_group_rows(&mut self, alias: &str, rows: SqlExpression) {
        self.group_rows.insert(alias.to_string(), rows);
    }

    /// Binding a lambda parameter receives for rows of `select`
    pub fn binding_of(&self, select: &SelectExpr) -> Binding {
        if select.is_grouped() {
            let rows = self
                .group_rows
                .get(select.alias())
                .cloned()
                .unwrap_or_else(|| select.from().clone());
            Binding::Group(Arc::new(GroupBinding::from_select(select, rows)))
        } else {
            Binding::Source(SqlExpression::Select(Box::new(select.clone())))
        }
    }
}

/// `SELECT alias.* FROM (<select>) AS alias`
pub fn derived_table(select: SelectExpr) -> TranslationResult<SelectExpr> {
    let alias = select.alias().to_string();
    let table = TableExpr::new(alias.clone(), alias.clone())?;
    let star = Projection::star(ColumnExpr::star(table), STAR)?;
    Ok(SelectExpr::new(
        alias,
        vec![star],
        SqlExpression::Select(Box::new(select)),
    )?)
}

/// Extend `ctx` with the parameters of `lambda` bound positionally
pub fn bind_lambda(
    lambda: &LambdaExpr,
    bindings: Vec<Binding>,
    ctx: &Arc<TranslationContext>,
) -> TranslationResult<Arc<TranslationContext>> {
    if lambda.params.len() > bindings.len() {
        return Err(TranslationError::unsupported(format!(
            "lambda declares {} parameter(s) but {} can be bound",
            lambda.params.len(),
            bindings.len()
        )));
    }
    let frame = lambda.params.iter().cloned().zip(bindings).collect();
    Ok(ctx.extend(frame))
}

/// Receiver of an operator call
pub fn source_of(call: &MethodCallExpr) -> TranslationResult<&Expression> {
    call.source
        .as_deref()
        .ok_or_else(|| TranslationError::missing(&call.method, "source"))
}

/// Lambda argument at `index`
pub fn lambda_arg(call: &MethodCallExpr, index: usize) -> TranslationResult<&LambdaExpr> {
    call.args
        .get(index)
        .ok_or_else(|| TranslationError::missing(&call.method, format!("argument {}", index)))?
        .as_lambda()
        .ok_or_else(|| TranslationError::NonConstantArgument {
            method: call.method.clone(),
            position: index,
            expected: "a lambda".to_string(),
        })
}

pub fn sql_operator(op: BinaryOperator) -> SqlOperator {
    match op {
        BinaryOperator::Equal => SqlOperator::Equal,
        BinaryOperator::NotEqual => SqlOperator::NotEqual,
        BinaryOperator::GreaterThan => SqlOperator::GreaterThan,
        BinaryOperator::GreaterThanOrEqual => SqlOperator::GreaterThanOrEqual,
        BinaryOperator::LessThan => SqlOperator::LessThan,
        BinaryOperator::LessThanOrEqual => SqlOperator::LessThanOrEqual,
        BinaryOperator::Add => SqlOperator::Add,
        BinaryOperator::Subtract => SqlOperator::Subtract,
        BinaryOperator::Multiply => SqlOperator::Multiply,
        BinaryOperator::Divide => SqlOperator::Divide,
        BinaryOperator::Modulo => SqlOperator::Modulo,
        BinaryOperator::And => SqlOperator::And,
        BinaryOperator::Or => SqlOperator::Or,
    }
}

/// Binary node with columns kept on the left of comparisons
pub fn binary_expression(
    left: SqlExpression,
    op: SqlOperator,
    right: SqlExpression,
) -> SqlExpression {
    let constant_left = matches!(left, SqlExpression::Constant(_));
    let column_right = matches!(right, SqlExpression::Column(_));
    match op.flipped() {
        Some(flipped) if constant_left && column_right => {
            SqlExpression::binary(right, flipped, left)
        }
        _ => SqlExpression::binary(left, op, right),
    }
}

fn group_member(group: &GroupBinding, member: &str) -> TranslationResult<SqlExpression> {
    if member == GROUP_KEY
        && let Some(key) = group.single_key()
    {
        return Ok(key.clone());
    }
    if let Some(key) = group.key(member) {
        return Ok(key.clone());
    }
    if let Some(aggregate) = group.aggregate(member) {
        return Ok(aggregate.clone());
    }
    Err(TranslationError::unsupported(format!(
        "group has no key or aggregate named '{}'",
        member
    )))
}

/// Member of a select row
///
/// Projected columns resolve to their expression; `<member>_all` unwraps to
/// its table; otherwise the member is read from the star projection. With no
/// usable star this degrades to a column on the select alias.
fn select_member(select: &SelectExpr, member: &str) -> TranslationResult<SqlExpression> {
    if let Some(projection) = select.find_projection(member) {
        return Ok(projection.expr().clone());
    }

    let whole_row = format!("{}{}", member, WHOLE_ROW_SUFFIX);
    if let Some(column) = select
        .find_projection(&whole_row)
        .and_then(Projection::star_column)
    {
        return Ok(SqlExpression::Table(column.table().clone()));
    }

    let stars: Vec<&ColumnExpr> = select.star_projections().collect();
    let table = match stars.as_slice() {
        [only] => only.table().clone(),
        [first, ..] => {
            warn!(
                member,
                select = select.alias(),
                candidates = stars.len(),
                "ambiguous member on multiple star projections, using the first"
            );
            first.table().clone()
        }
        [] => {
            warn!(
                member,
                select = select.alias(),
                "member not found in projection, using a column on the select alias"
            );
            TableExpr::new(select.alias(), select.alias())?
        }
    };
    Ok(SqlExpression::Column(ColumnExpr::new(member, table)?))
}

/// `.length` and date parts of a scalar
fn scalar_member(scalar: SqlExpression, member: &str) -> TranslationResult<SqlExpression> {
    let function = match member {
        "length" => "LEN",
        "year" => "YEAR",
        "month" => "MONTH",
        "day" => "DAY",
        "date" => "DATE",
        "hour" => "HOUR",
        "minute" => "MINUTE",
        "second" => "SECOND",
        _ => {
            return Err(TranslationError::unsupported(format!(
                "member '{}' of {}",
                member,
                scalar.kind()
            )));
        }
    };
    Ok(SqlExpression::function(function, vec![scalar]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableExpr {
        TableExpr::new("Users", "u").unwrap()
    }

    #[test]
    fn test_constant_left_comparison_flips() {
        let age = SqlExpression::Column(ColumnExpr::new("age", users()).unwrap());
        let flipped = binary_expression(
            SqlExpression::constant(30),
            SqlOperator::LessThan,
            age.clone(),
        );
        assert_eq!(
            flipped,
            SqlExpression::binary(age.clone(), SqlOperator::GreaterThan, SqlExpression::constant(30))
        );

        let kept = binary_expression(SqlExpression::constant(30), SqlOperator::Subtract, age.clone());
        assert!(matches!(
            kept,
            SqlExpression::Binary(ref b) if b.op == SqlOperator::Subtract
                && matches!(*b.left, SqlExpression::Constant(_))
        ));
    }

    #[test]
    fn test_select_member_degrades_without_star() {
        let name = SqlExpression::Column(ColumnExpr::new("name", users()).unwrap());
        let select = SelectExpr::new(
            "u",
            vec![Projection::new(name.clone(), "name").unwrap()],
            SqlExpression::Table(users()),
        )
        .unwrap();

        assert_eq!(select_member(&select, "name").unwrap(), name);
        let fallback = select_member(&select, "email").unwrap();
        let column = fallback.as_column().unwrap();
        assert_eq!(column.name(), "email");
        assert_eq!(column.table().name(), "u");
    }

    #[test]
    fn test_scalar_members() {
        let date = SqlExpression::Column(ColumnExpr::new("createdAt", users()).unwrap());
        let year = scalar_member(date.clone(), "year").unwrap();
        assert_eq!(year, SqlExpression::function("YEAR", vec![date.clone()]));
        assert!(scalar_member(date, "weekday").is_err());
    }
}
