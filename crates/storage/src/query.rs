// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition/ordering/pagination model shared by every repository, plus
//! the SQL-fragment assembly helpers repositories use to build queries
//! against the external store.

/// A single `field OP value` condition. `value` is always text — the
/// store is a SQL-like black box, not a typed query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub op: ConditionOp,
    pub value: String,
}

impl QueryCondition {
    pub fn new(field: impl Into<String>, op: ConditionOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, ConditionOp::Eq, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
}

impl ConditionOp {
    fn as_sql(&self) -> &'static str {
        match self {
            ConditionOp::Eq => "=",
            ConditionOp::Ne => "!=",
            ConditionOp::Lt => "<",
            ConditionOp::Le => "<=",
            ConditionOp::Gt => ">",
            ConditionOp::Ge => ">=",
            ConditionOp::Like => "LIKE",
            ConditionOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// 1-based page number and page size; translates to `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size,
        }
    }

    pub fn limit(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.size
    }
}

/// Escape a user-provided value for embedding in a single-quoted SQL
/// literal: `'` is doubled.
pub fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render one condition as a SQL fragment. `LIKE` wraps the value in
/// `%...%`; `IN` splits a comma-separated value list into a literal set.
pub fn condition_to_sql(cond: &QueryCondition) -> String {
    match cond.op {
        ConditionOp::Like => format!(
            "{} LIKE '%{}%'",
            cond.field,
            sql_escape(&cond.value)
        ),
        ConditionOp::In => {
            let items: Vec<String> = cond
                .value
                .split(',')
                .map(|v| format!("'{}'", sql_escape(v.trim())))
                .collect();
            format!("{} IN ({})", cond.field, items.join(", "))
        }
        _ => format!(
            "{} {} '{}'",
            cond.field,
            cond.op.as_sql(),
            sql_escape(&cond.value)
        ),
    }
}

/// Render a full `WHERE` clause (without the `WHERE` keyword) from a
/// conjunction of conditions. Empty input yields an empty string.
pub fn conditions_to_where(conds: &[QueryCondition]) -> String {
    conds
        .iter()
        .map(condition_to_sql)
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub fn order_by_to_sql(order: &OrderBy) -> String {
    format!(
        "{} {}",
        order.field,
        if order.ascending { "ASC" } else { "DESC" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_single_quotes_by_doubling() {
        assert_eq!(sql_escape("O'Brien"), "O''Brien");
    }

    #[test]
    fn like_wraps_value_in_percent_signs() {
        let cond = QueryCondition::new("name", ConditionOp::Like, "pump");
        assert_eq!(condition_to_sql(&cond), "name LIKE '%pump%'");
    }

    #[test]
    fn in_splits_comma_separated_values() {
        let cond = QueryCondition::new("id", ConditionOp::In, "a, b,c");
        assert_eq!(condition_to_sql(&cond), "id IN ('a', 'b', 'c')");
    }

    #[test]
    fn pagination_computes_limit_and_offset() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn pagination_page_is_clamped_to_at_least_one() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn conditions_join_with_and() {
        let conds = vec![
            QueryCondition::eq("device_id", "d-1"),
            QueryCondition::new("enabled", ConditionOp::Eq, "true"),
        ];
        assert_eq!(
            conditions_to_where(&conds),
            "device_id = 'd-1' AND enabled = 'true'"
        );
    }
}
