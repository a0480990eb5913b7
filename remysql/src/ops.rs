//! High-level statement operations
//!
//! `select/insert/update/delete` semantics assembled through the query
//! builder and run through the retrying executor. Statement text never
//! leaves this layer unescaped.

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Result;
use crate::executor::CommandResult;
use crate::query::{
    build_delete, build_insert, build_insert_many, build_replace_many, build_select,
    build_update, build_update_many_case, build_upsert_many, CaseWhen, SqlArg, WhereClause,
};
use crate::row::Row;

impl<D: Driver> Connection<D> {
    /// Select matching rows. An empty column list selects `*`.
    pub async fn select_where(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &WhereClause,
    ) -> Result<Vec<Row>> {
        let sql = build_select(&self.driver, table, columns, filter, None, None)?;
        Ok(self.execute(&sql).await?.rows)
    }

    /// Select at most one row.
    pub async fn select_one_where(
        &mut self,
        table: &str,
        columns: &[&str],
        filter: &WhereClause,
    ) -> Result<Option<Row>> {
        let sql = build_select(&self.driver, table, columns, filter, None, Some(1))?;
        Ok(self.execute(&sql).await?.rows.into_iter().next())
    }

    /// Insert one row; returns the driver-reported last-insert-id.
    pub async fn insert_one(
        &mut self,
        table: &str,
        assignments: &[(&str, SqlArg)],
    ) -> Result<Option<u64>> {
        let sql = build_insert(&self.driver, table, assignments)?;
        Ok(self.execute(&sql).await?.last_insert_id)
    }

    /// Insert many rows in one statement; returns the affected-row count.
    pub async fn insert_many(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlArg>],
    ) -> Result<u64> {
        let sql = build_insert_many(&self.driver, table, columns, rows)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Replace many rows in one statement; returns the affected-row count.
    pub async fn replace_many(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlArg>],
    ) -> Result<u64> {
        let sql = build_replace_many(&self.driver, table, columns, rows)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Insert-or-update many rows; returns the affected-row count.
    pub async fn upsert_many(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlArg>],
        update_columns: Option<&[&str]>,
    ) -> Result<u64> {
        let sql = build_upsert_many(&self.driver, table, columns, rows, update_columns)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Update matching rows; returns the affected-row count.
    pub async fn update_where(
        &mut self,
        table: &str,
        assignments: &[(&str, SqlArg)],
        filter: &WhereClause,
    ) -> Result<u64> {
        let sql = build_update(&self.driver, table, assignments, filter)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Rewrite one column across many rows with per-key replacement values;
    /// returns the affected-row count.
    pub async fn update_many_case(
        &mut self,
        table: &str,
        set_column: &str,
        key_column: &str,
        cases: &[CaseWhen],
    ) -> Result<u64> {
        let sql = build_update_many_case(&self.driver, table, set_column, key_column, cases)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Delete matching rows; returns the affected-row count.
    pub async fn delete_where(&mut self, table: &str, filter: &WhereClause) -> Result<u64> {
        let sql = build_delete(&self.driver, table, filter)?;
        Ok(self.execute(&sql).await?.affected_rows)
    }

    /// Run caller-supplied SQL. Alias for [`Connection::execute`] kept next
    /// to the structured operations.
    pub async fn query_raw(&mut self, sql: &str) -> Result<CommandResult> {
        self.execute(sql).await
    }
}
