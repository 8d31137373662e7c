//! CRUD facade.
//!
//! [`Db`] assembles statements from cached field descriptors and runs them through a
//! [`DbHandle`]. Every operation logs its final statement at debug level before
//! executing it. Failures are logged with the table, method and statement, then
//! collapsed into a [`DbError`] kind.
//!
//! # Example
//!
//! ```ignore
//! use tagorm::{Condition, Db, DbConfig, Record, SelectOptions};
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[record(column = "users.id")]
//!     id: i64,
//!     #[record(column = "users.name")]
//!     name: String,
//!     #[record(column = "teams.name", join = "LEFT JOIN teams ON teams.id = users.team_id")]
//!     team: Option<String>,
//! }
//!
//! let db = Db::new(tagorm::create_pool(&url)?, DbConfig::default());
//! let users: Vec<User> = db
//!     .get_all("users", &SelectOptions::new().order_by("users.id").limit(20))
//!     .await?;
//! ```

use crate::bind::{BindStyle, bind_named};
use crate::cache::FieldCache;
use crate::client::DbHandle;
use crate::condition::Condition;
use crate::config::DbConfig;
use crate::error::{DbError, DbResult, OrmError, OrmResult};
use crate::field;
use crate::record::{Record, RecordSource};
use crate::row::FromRow;
use crate::sql::Sql;
use crate::value::Value;

/// Filters, ordering and paging for [`Db::get_all`].
///
/// A zero `limit` omits `LIMIT`; a zero `offset` omits `OFFSET`. A non-zero offset is
/// applied even without a limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub filters: Vec<Condition>,
    /// Raw `ORDER BY` items such as `"users.created_at DESC"`.
    pub orders: Vec<String>,
    pub limit: u64,
    pub offset: u64,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.orders.push(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// Record-driven CRUD over a [`DbHandle`].
pub struct Db<H> {
    handle: H,
    cache: FieldCache,
    config: DbConfig,
}

impl<H: DbHandle> Db<H> {
    /// Create a facade with an empty field cache.
    pub fn new(handle: H, config: DbConfig) -> Self {
        Self {
            handle,
            cache: FieldCache::new(),
            config,
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn is_select_only(&self) -> bool {
        self.config.select_only
    }

    /// Close the underlying handle.
    pub fn close(&self) {
        self.handle.close();
    }

    // ==================== Statement rendering ====================

    fn build_select<T: Record>(
        &self,
        table: &str,
        filters: &[Condition],
        orders: &[String],
        limit: u64,
        offset: u64,
    ) -> OrmResult<Sql> {
        let fields = self.cache.fields::<T>();
        let columns = field::render_select(&fields);
        if columns.is_empty() {
            return Err(OrmError::build(format!(
                "{} has no selectable fields",
                T::record_key().type_name()
            )));
        }

        let mut q = Sql::new("SELECT ");
        q.push(&columns.join(", ")).push(" FROM ");
        q.push_ident(table)?;
        for join in field::render_joins(&fields) {
            q.push(" ").push(join);
        }
        q.push_where_and(filters);
        if !orders.is_empty() {
            q.push(" ORDER BY ").push(&orders.join(", "));
        }
        if limit > 0 {
            q.limit(to_i64(limit, "limit")?);
        }
        if offset > 0 {
            q.offset(to_i64(offset, "offset")?);
        }
        Ok(q)
    }

    /// The SELECT statement [`Db::get_all`] would run.
    pub fn render_select<T: Record>(&self, table: &str, opts: &SelectOptions) -> OrmResult<Sql> {
        self.build_select::<T>(table, &opts.filters, &opts.orders, opts.limit, opts.offset)
    }

    /// The INSERT statement [`Db::create`] would run.
    pub fn render_insert<S>(&self, table: &str, record: &S, with_id: bool) -> OrmResult<Sql>
    where
        S: RecordSource + ?Sized,
    {
        let mut q = Sql::new("INSERT INTO ");
        q.push_ident(table)?;
        match self.config.bind_style {
            BindStyle::Positional => {
                let insert = self.cache.insert_fields(table, record);
                if insert.is_empty() {
                    q.push(" DEFAULT VALUES");
                } else {
                    q.push(" (").push(&insert.columns.join(", ")).push(") VALUES (");
                    q.push_bind_list(insert.values).push(")");
                }
            }
            BindStyle::Named => {
                let template = self.cache.named_insert_fields(table, record);
                if template.is_empty() {
                    q.push(" DEFAULT VALUES");
                } else {
                    q.push(" (").push(&template.columns).push(") VALUES (");
                    bind_named(&mut q, &template.placeholders, &self.cache.get(record, true))?;
                    q.push(")");
                }
            }
        }

        if with_id {
            q.push(" RETURNING ");
            q.push_ident(&self.config.returning_column)?;
        }
        Ok(q)
    }

    /// The UPDATE statement [`Db::update`] would run.
    pub fn render_update<S>(
        &self,
        table: &str,
        key_column: &str,
        key_value: impl Into<Value>,
        record: &S,
    ) -> OrmResult<Sql>
    where
        S: RecordSource + ?Sized,
    {
        let key = Condition::eq(key_column, key_value)?;
        let no_fields = || OrmError::build(format!("no writable fields for table '{table}'"));

        let mut q = Sql::new("UPDATE ");
        q.push_ident(table)?;
        q.push(" SET ");
        match self.config.bind_style {
            BindStyle::Positional => {
                let assignments = self.cache.update_fields(table, record);
                if assignments.is_empty() {
                    return Err(no_fields());
                }
                for (i, assignment) in assignments.into_iter().enumerate() {
                    if i > 0 {
                        q.push(", ");
                    }
                    q.push(assignment.column).push(" = ").push_bind(assignment.value);
                }
            }
            BindStyle::Named => {
                let assignments = self.cache.named_update_fields(table, record);
                if assignments.is_empty() {
                    return Err(no_fields());
                }
                bind_named(&mut q, &assignments.join(", "), &self.cache.get(record, true))?;
            }
        }
        q.push_where_and(std::slice::from_ref(&key));
        Ok(q)
    }

    /// The DELETE statement [`Db::delete`] would run.
    pub fn render_delete(
        &self,
        table: &str,
        key_column: &str,
        key_value: impl Into<Value>,
    ) -> OrmResult<Sql> {
        let key = Condition::eq(key_column, key_value)?;
        let mut q = Sql::new("DELETE FROM ");
        q.push_ident(table)?;
        q.push_where_and(std::slice::from_ref(&key));
        Ok(q)
    }

    // ==================== Operations ====================

    /// Select every matching row into `T`.
    pub async fn get_all<T>(&self, table: &str, opts: &SelectOptions) -> DbResult<Vec<T>>
    where
        T: Record + FromRow,
    {
        const METHOD: &str = "get_all";
        let q = self
            .render_select::<T>(table, opts)
            .map_err(|e| failure(DbError::Select, table, METHOD, None, &e))?;
        log_statement(table, METHOD, &q);
        q.fetch_all_as(&self.handle)
            .await
            .map_err(|e| failure(DbError::Select, table, METHOD, Some(&q), &e))
    }

    /// Select the first row matching `filters` into `T`.
    ///
    /// No matching row is a [`DbError::Select`].
    pub async fn get_one<T>(&self, table: &str, filters: &[Condition]) -> DbResult<T>
    where
        T: Record + FromRow,
    {
        const METHOD: &str = "get_one";
        let q = self
            .build_select::<T>(table, filters, &[], 0, 0)
            .map_err(|e| failure(DbError::Select, table, METHOD, None, &e))?;
        log_statement(table, METHOD, &q);
        q.fetch_one_as(&self.handle)
            .await
            .map_err(|e| failure(DbError::Select, table, METHOD, Some(&q), &e))
    }

    /// Insert `record` into `table`.
    ///
    /// With `with_id`, appends `RETURNING <returning_column>` and returns the scanned
    /// id; otherwise returns `0`. In select-only mode nothing is executed and a random
    /// positive id is returned.
    pub async fn create<S>(&self, table: &str, record: &S, with_id: bool) -> DbResult<i64>
    where
        S: RecordSource + ?Sized,
    {
        const METHOD: &str = "create";
        if self.config.select_only {
            let id = fabricated_id();
            tracing::debug!(target: "tagorm.sql", table_name = table, method = METHOD, id, "select-only: insert skipped");
            return Ok(id);
        }

        let q = self
            .render_insert(table, record, with_id)
            .map_err(|e| failure(DbError::Create, table, METHOD, None, &e))?;
        log_statement(table, METHOD, &q);

        let result = if with_id {
            q.fetch_id(&self.handle).await
        } else {
            q.execute(&self.handle).await.map(|_| 0)
        };
        result.map_err(|e| failure(DbError::Create, table, METHOD, Some(&q), &e))
    }

    /// Update the rows where `key_column = key_value` with `record`'s writable fields.
    ///
    /// Returns the affected row count (`0` in select-only mode).
    pub async fn update<S>(
        &self,
        table: &str,
        key_column: &str,
        key_value: impl Into<Value>,
        record: &S,
    ) -> DbResult<u64>
    where
        S: RecordSource + ?Sized,
    {
        const METHOD: &str = "update";
        if self.config.select_only {
            tracing::debug!(target: "tagorm.sql", table_name = table, method = METHOD, "select-only: update skipped");
            return Ok(0);
        }

        let q = self
            .render_update(table, key_column, key_value, record)
            .map_err(|e| failure(DbError::Update, table, METHOD, None, &e))?;
        log_statement(table, METHOD, &q);
        q.execute(&self.handle)
            .await
            .map_err(|e| failure(DbError::Update, table, METHOD, Some(&q), &e))
    }

    /// Delete the rows where `key_column = key_value`.
    ///
    /// Returns the affected row count (`0` in select-only mode).
    pub async fn delete(
        &self,
        table: &str,
        key_column: &str,
        key_value: impl Into<Value>,
    ) -> DbResult<u64> {
        const METHOD: &str = "delete";
        if self.config.select_only {
            tracing::debug!(target: "tagorm.sql", table_name = table, method = METHOD, "select-only: delete skipped");
            return Ok(0);
        }

        let q = self
            .render_delete(table, key_column, key_value)
            .map_err(|e| failure(DbError::Delete, table, METHOD, None, &e))?;
        log_statement(table, METHOD, &q);
        q.execute(&self.handle)
            .await
            .map_err(|e| failure(DbError::Delete, table, METHOD, Some(&q), &e))
    }

    /// Run a caller-built statement with `$n` parameters. Returned rows are discarded.
    ///
    /// A no-op in select-only mode.
    pub async fn query(&self, sql: &str, params: &[Value]) -> DbResult<()> {
        const METHOD: &str = "query";
        if self.config.select_only {
            tracing::debug!(target: "tagorm.sql", method = METHOD, "select-only: query skipped");
            return Ok(());
        }

        let literals: Vec<String> = params.iter().map(Value::to_literal).collect();
        tracing::debug!(target: "tagorm.sql", method = METHOD, sql, params = ?literals, "executing statement");

        let refs: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = params
            .iter()
            .map(|p| p as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();
        self.handle.query(sql, &refs).await.map(|_| ()).map_err(|e| {
            tracing::error!(target: "tagorm.sql", method = METHOD, sql, error = %e, "statement failed");
            DbError::Query
        })
    }
}

fn to_i64(n: u64, what: &str) -> OrmResult<i64> {
    i64::try_from(n).map_err(|_| OrmError::validation(format!("{what} {n} exceeds i64::MAX")))
}

/// Random positive id for select-only inserts.
fn fabricated_id() -> i64 {
    let (hi, _) = uuid::Uuid::new_v4().as_u64_pair();
    ((hi >> 1) as i64).max(1)
}

fn log_statement(table: &str, method: &'static str, q: &Sql) {
    tracing::debug!(
        target: "tagorm.sql",
        table_name = table,
        method,
        sql = %q.to_sql(),
        params = ?q.param_literals(),
        "executing statement"
    );
}

fn failure(kind: DbError, table: &str, method: &'static str, q: Option<&Sql>, err: &OrmError) -> DbError {
    let sql = q.map(Sql::to_sql).unwrap_or_default();
    tracing::error!(
        target: "tagorm.sql",
        table_name = table,
        method,
        sql = %sql,
        error = %err,
        "statement failed"
    );
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fabricated_ids_are_positive() {
        for _ in 0..64 {
            assert!(fabricated_id() > 0);
        }
    }

    #[test]
    fn select_options_builder() {
        let opts = SelectOptions::new()
            .filter(Condition::eq("users.id", 1_i64).unwrap())
            .order_by("users.id DESC")
            .limit(5)
            .offset(10);
        assert_eq!(opts.filters.len(), 1);
        assert_eq!(opts.orders, vec!["users.id DESC".to_string()]);
        assert_eq!((opts.limit, opts.offset), (5, 10));
    }

    #[test]
    fn paging_values_must_fit_i64() {
        assert_eq!(to_i64(10, "limit").unwrap(), 10);
        assert!(to_i64(u64::MAX, "limit").is_err());
    }
}
