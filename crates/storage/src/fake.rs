// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory `SqlStore` for repository tests, in the same spirit as
//! `pulseone-core`'s `FakeClock`: no real database, just enough of the
//! statement grammar the repository layer actually emits.
//!
//! This is not a general SQL engine — it understands exactly the
//! `SELECT`/`REPLACE INTO`/`DELETE FROM` shapes [`crate::repository::Repository`]
//! builds, which is the only grammar this crate needs to round-trip.

use crate::entity::Row;
use crate::sql_store::SqlStore;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeSqlStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    pub fail_next_write: std::sync::atomic::AtomicBool,
}

impl FakeSqlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map(Vec::len).unwrap_or(0)
    }
}

impl SqlStore for FakeSqlStore {
    fn execute_query(&self, sql: &str) -> Vec<Row> {
        let table = table_name_from(sql);
        let tables = self.tables.lock();
        let Some(rows) = tables.get(&table) else {
            return Vec::new();
        };

        let mut result: Vec<Row> = match where_clause(sql) {
            Some(clause) => rows.iter().filter(|r| matches_where(r, clause)).cloned().collect(),
            None => rows.clone(),
        };

        if let Some((field, ascending)) = order_by(sql) {
            result.sort_by(|a, b| {
                let av = a.get(&field).cloned().unwrap_or_default();
                let bv = b.get(&field).cloned().unwrap_or_default();
                if ascending {
                    av.cmp(&bv)
                } else {
                    bv.cmp(&av)
                }
            });
        }

        if let Some((limit, offset)) = limit_offset(sql) {
            result = result.into_iter().skip(offset).take(limit).collect();
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT COUNT(*)") {
            // `Repository::count_by_conditions` only ever inspects `.len()`
            // of the returned rows, so one placeholder row per match is
            // enough to make the count observable through the same
            // `execute_query` seam `SELECT *` uses.
            return vec![Row::new(); result.len()];
        }
        result
    }

    fn execute_non_query(&self, sql: &str) -> bool {
        if self
            .fail_next_write
            .swap(false, std::sync::atomic::Ordering::Relaxed)
        {
            return false;
        }
        let upper = sql.trim_start().to_uppercase();
        let table = table_name_from(sql);
        let mut tables = self.tables.lock();
        let rows = tables.entry(table).or_default();

        if upper.starts_with("REPLACE INTO") || upper.starts_with("INSERT INTO") {
            let Some(new_row) = parse_insert_values(sql) else {
                return false;
            };
            let id = new_row.get("id").cloned();
            if let Some(id) = id {
                rows.retain(|r| r.get("id") != Some(&id));
            }
            rows.push(new_row);
            true
        } else if upper.starts_with("DELETE FROM") {
            let Some(clause) = where_clause(sql) else {
                return false;
            };
            let before = rows.len();
            rows.retain(|r| !matches_where(r, clause));
            rows.len() < before
        } else {
            false
        }
    }
}

fn table_name_from(sql: &str) -> String {
    let keywords = ["FROM", "INTO"];
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    for (i, tok) in tokens.iter().enumerate() {
        if keywords.contains(&tok.to_uppercase().as_str()) {
            if let Some(table) = tokens.get(i + 1) {
                return table.trim_matches(|c| c == '(' || c == ')').to_string();
            }
        }
    }
    String::new()
}

fn where_clause(sql: &str) -> Option<&str> {
    let upper = sql.to_uppercase();
    let start = upper.find(" WHERE ")? + 7;
    let mut end = sql.len();
    for kw in [" ORDER BY ", " LIMIT "] {
        if let Some(pos) = upper[start..].find(kw) {
            end = end.min(start + pos);
        }
    }
    Some(&sql[start..end])
}

fn matches_where(row: &Row, clause: &str) -> bool {
    clause.split(" AND ").all(|cond| matches_condition(row, cond.trim()))
}

fn matches_condition(row: &Row, cond: &str) -> bool {
    if let Some((field, rest)) = cond.split_once(" IN ") {
        let field = field.trim();
        let Some(actual) = row.get(field) else { return false };
        let list = rest.trim().trim_start_matches('(').trim_end_matches(')');
        return list.split(',').any(|v| v.trim().trim_matches('\'') == actual);
    }
    if let Some((field, rest)) = cond.split_once(" LIKE ") {
        let field = field.trim();
        let Some(actual) = row.get(field) else { return false };
        let needle = rest.trim().trim_matches('\'').trim_matches('%');
        return actual.contains(needle);
    }
    let ops: [(&str, fn(&str, &str) -> bool); 6] = [
        ("!=", |a: &str, b: &str| a != b),
        (">=", |a: &str, b: &str| numeric_cmp(a, b).is_ge()),
        ("<=", |a: &str, b: &str| numeric_cmp(a, b).is_le()),
        ("=", |a: &str, b: &str| a == b),
        (">", |a: &str, b: &str| numeric_cmp(a, b).is_gt()),
        ("<", |a: &str, b: &str| numeric_cmp(a, b).is_lt()),
    ];
    for (op, cmp) in ops {
        if let Some((field, rest)) = cond.split_once(op) {
            let field = field.trim();
            let Some(actual) = row.get(field) else { return false };
            let expected = rest.trim().trim_matches('\'');
            return cmp(actual, expected);
        }
    }
    false
}

fn numeric_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn order_by(sql: &str) -> Option<(String, bool)> {
    let upper = sql.to_uppercase();
    let start = upper.find("ORDER BY ")? + "ORDER BY ".len();
    let rest = &sql[start..];
    let end = rest.to_uppercase().find(" LIMIT ").unwrap_or(rest.len());
    let fragment = rest[..end].trim();
    let ascending = !fragment.to_uppercase().ends_with("DESC");
    let field = fragment
        .split_whitespace()
        .next()
        .unwrap_or(fragment)
        .to_string();
    Some((field, ascending))
}

fn limit_offset(sql: &str) -> Option<(usize, usize)> {
    let upper = sql.to_uppercase();
    let limit_start = upper.find("LIMIT ")? + "LIMIT ".len();
    let rest = &sql[limit_start..];
    let limit_end = rest.find(' ').unwrap_or(rest.len());
    let limit: usize = rest[..limit_end].trim().parse().ok()?;
    let offset = match rest.to_uppercase().find("OFFSET ") {
        Some(pos) => rest[pos + 7..].trim().parse().ok()?,
        None => 0,
    };
    Some((limit, offset))
}

fn parse_insert_values(sql: &str) -> Option<Row> {
    let cols_start = sql.find('(')? + 1;
    let cols_end = sql.find(')')?;
    let cols: Vec<String> = sql[cols_start..cols_end]
        .split(',')
        .map(|c| c.trim().to_string())
        .collect();

    let values_start = sql[cols_end..].find("VALUES")? + cols_end + "VALUES".len();
    let vals_start = sql[values_start..].find('(')? + values_start + 1;
    let vals_end = sql[vals_start..].rfind(')')? + vals_start;
    let raw_vals = &sql[vals_start..vals_end];

    let mut values = Vec::with_capacity(cols.len());
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = raw_vals.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quote && chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
            }
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    values.push(current.trim().to_string());

    let mut row = Row::new();
    for (col, val) in cols.into_iter().zip(values) {
        row.insert(col, val);
    }
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_select_by_id() {
        let store = FakeSqlStore::new();
        store.execute_non_query("REPLACE INTO widgets (id, name) VALUES ('w-1', 'O''Brien')");
        let rows = store.execute_query("SELECT * FROM widgets WHERE id = 'w-1'");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap(), "O'Brien");
    }

    #[test]
    fn replace_overwrites_same_id() {
        let store = FakeSqlStore::new();
        store.execute_non_query("REPLACE INTO widgets (id, name) VALUES ('w-1', 'a')");
        store.execute_non_query("REPLACE INTO widgets (id, name) VALUES ('w-1', 'b')");
        assert_eq!(store.row_count("widgets"), 1);
        let rows = store.execute_query("SELECT * FROM widgets WHERE id = 'w-1'");
        assert_eq!(rows[0].get("name").unwrap(), "b");
    }

    #[test]
    fn delete_removes_matching_row() {
        let store = FakeSqlStore::new();
        store.execute_non_query("REPLACE INTO widgets (id) VALUES ('w-1')");
        assert!(store.execute_non_query("DELETE FROM widgets WHERE id = 'w-1'"));
        assert_eq!(store.row_count("widgets"), 0);
    }

    #[test]
    fn limit_offset_and_order_by_are_applied() {
        let store = FakeSqlStore::new();
        for i in 1..=5 {
            store.execute_non_query(&format!(
                "REPLACE INTO widgets (id, seq) VALUES ('w-{i}', '{i}')"
            ));
        }
        let rows = store.execute_query("SELECT * FROM widgets ORDER BY seq ASC LIMIT 2 OFFSET 1");
        let seqs: Vec<&str> = rows.iter().map(|r| r.get("seq").unwrap().as_str()).collect();
        assert_eq!(seqs, vec!["2", "3"]);
    }
}
