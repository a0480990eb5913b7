//! Statement builders
//!
//! Builders for the write path (insert, replace, upsert, update, delete) and
//! plain selects. All of them validate structure before emitting any SQL:
//! empty column lists, ragged rows, and incomplete case/when pairs are
//! builder errors, never malformed statements.

use crate::driver::Escaper;
use crate::error::BuilderError;
use crate::query::escape::format_arg;
use crate::query::where_clause::WhereClause;
use crate::query::SqlArg;

/// One `WHEN match THEN replacement` arm of an update-many statement.
///
/// Both sides are optional at the type level so sparse caller data can be
/// represented; [`build_update_many_case`] rejects pairs with either side
/// missing.
#[derive(Debug, Clone)]
pub struct CaseWhen {
    pub when_value: Option<SqlArg>,
    pub then_value: Option<SqlArg>,
}

impl CaseWhen {
    pub fn new(when_value: impl Into<SqlArg>, then_value: impl Into<SqlArg>) -> Self {
        Self {
            when_value: Some(when_value.into()),
            then_value: Some(then_value.into()),
        }
    }
}

/// `SELECT columns FROM table [WHERE ...] [ORDER BY ...] [LIMIT n]`.
/// An empty column list selects `*`.
pub fn build_select(
    escaper: &dyn Escaper,
    table: &str,
    columns: &[&str],
    filter: &WhereClause,
    order_by: Option<&str>,
    limit: Option<u64>,
) -> Result<String, BuilderError> {
    let column_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };
    let mut sql = format!("SELECT {column_list} FROM {table}");
    append_where(&mut sql, escaper, filter)?;
    if let Some(order) = order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(sql)
}

/// `INSERT INTO table (columns) VALUES (literals)` for one row.
pub fn build_insert(
    escaper: &dyn Escaper,
    table: &str,
    assignments: &[(&str, SqlArg)],
) -> Result<String, BuilderError> {
    if assignments.is_empty() {
        return Err(BuilderError::EmptyColumns);
    }
    let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
    let mut literals = Vec::with_capacity(assignments.len());
    for (_, value) in assignments {
        literals.push(format_arg(escaper, value)?);
    }
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(","),
        literals.join(",")
    ))
}

/// Multi-row `INSERT INTO table (columns) VALUES (...),(...)`.
pub fn build_insert_many(
    escaper: &dyn Escaper,
    table: &str,
    columns: &[&str],
    rows: &[Vec<SqlArg>],
) -> Result<String, BuilderError> {
    let tuples = value_tuples(escaper, columns, rows)?;
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES {tuples}",
        columns.join(",")
    ))
}

/// Multi-row `REPLACE INTO table (columns) VALUES (...),(...)`.
pub fn build_replace_many(
    escaper: &dyn Escaper,
    table: &str,
    columns: &[&str],
    rows: &[Vec<SqlArg>],
) -> Result<String, BuilderError> {
    let tuples = value_tuples(escaper, columns, rows)?;
    Ok(format!(
        "REPLACE INTO {table} ({}) VALUES {tuples}",
        columns.join(",")
    ))
}

/// Multi-row upsert: `INSERT ... ON DUPLICATE KEY UPDATE col = VALUES(col)`.
///
/// `update_columns` limits which columns are rewritten on duplicate key;
/// by default every inserted column is.
pub fn build_upsert_many(
    escaper: &dyn Escaper,
    table: &str,
    columns: &[&str],
    rows: &[Vec<SqlArg>],
    update_columns: Option<&[&str]>,
) -> Result<String, BuilderError> {
    let tuples = value_tuples(escaper, columns, rows)?;
    let update_cols = update_columns.unwrap_or(columns);
    if update_cols.is_empty() {
        return Err(BuilderError::EmptyColumns);
    }
    let update_clause = update_cols
        .iter()
        .map(|c| format!("{c} = VALUES({c})"))
        .collect::<Vec<_>>()
        .join(",");
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES {tuples} ON DUPLICATE KEY UPDATE {update_clause}",
        columns.join(",")
    ))
}

/// `UPDATE table SET assignments [WHERE ...]`.
pub fn build_update(
    escaper: &dyn Escaper,
    table: &str,
    assignments: &[(&str, SqlArg)],
    filter: &WhereClause,
) -> Result<String, BuilderError> {
    if assignments.is_empty() {
        return Err(BuilderError::EmptyColumns);
    }
    let mut sets = Vec::with_capacity(assignments.len());
    for (column, value) in assignments {
        sets.push(format!("{column} = {}", format_arg(escaper, value)?));
    }
    let mut sql = format!("UPDATE {table} SET {}", sets.join(","));
    append_where(&mut sql, escaper, filter)?;
    Ok(sql)
}

/// Update many rows in one statement through a `CASE key WHEN ... THEN ...`
/// rewrite of a single column, keyed by `key_column`.
///
/// Rejects case/when pairs missing either the match value or the
/// replacement value before emitting anything.
pub fn build_update_many_case(
    escaper: &dyn Escaper,
    table: &str,
    set_column: &str,
    key_column: &str,
    cases: &[CaseWhen],
) -> Result<String, BuilderError> {
    if cases.is_empty() {
        return Err(BuilderError::EmptyRows);
    }

    let mut arms = Vec::with_capacity(cases.len());
    let mut keys = Vec::with_capacity(cases.len());
    for (index, case) in cases.iter().enumerate() {
        let when = case.when_value.as_ref().ok_or(BuilderError::IncompleteCasePair {
            index,
            missing: "match value",
        })?;
        let then = case.then_value.as_ref().ok_or(BuilderError::IncompleteCasePair {
            index,
            missing: "replacement value",
        })?;
        let when_literal = format_arg(escaper, when)?;
        arms.push(format!("WHEN {when_literal} THEN {}", format_arg(escaper, then)?));
        keys.push(when_literal);
    }

    Ok(format!(
        "UPDATE {table} SET {set_column} = CASE {key_column} {} ELSE {set_column} END WHERE {key_column} IN ({})",
        arms.join(" "),
        keys.join(",")
    ))
}

/// `DELETE FROM table [WHERE ...]`.
pub fn build_delete(
    escaper: &dyn Escaper,
    table: &str,
    filter: &WhereClause,
) -> Result<String, BuilderError> {
    let mut sql = format!("DELETE FROM {table}");
    append_where(&mut sql, escaper, filter)?;
    Ok(sql)
}

fn append_where(
    sql: &mut String,
    escaper: &dyn Escaper,
    filter: &WhereClause,
) -> Result<(), BuilderError> {
    if !filter.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.build(escaper)?);
    }
    Ok(())
}

fn value_tuples(
    escaper: &dyn Escaper,
    columns: &[&str],
    rows: &[Vec<SqlArg>],
) -> Result<String, BuilderError> {
    if columns.is_empty() {
        return Err(BuilderError::EmptyColumns);
    }
    if rows.is_empty() {
        return Err(BuilderError::EmptyRows);
    }

    let mut tuples = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(BuilderError::RowWidthMismatch {
                index,
                expected: columns.len(),
                got: row.len(),
            });
        }
        let mut literals = Vec::with_capacity(row.len());
        for value in row {
            literals.push(format_arg(escaper, value)?);
        }
        tuples.push(format!("({})", literals.join(",")));
    }
    Ok(tuples.join(","))
}
