//! Execution handle trait.
//!
//! [`DbHandle`] is the capability the [`Db`](crate::Db) facade executes through. It is
//! implemented for plain `tokio-postgres` clients and transactions and, with the `pool`
//! feature, for `deadpool-postgres` clients and pools. Tests and dry-run tooling can
//! provide their own implementation.

use crate::error::{OrmError, OrmResult};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A connection-like object that can run statements.
pub trait DbHandle: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Returns [`OrmError::NotFound`] if no rows are returned; extra rows are ignored.
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and scan the first column of the first row as an `i64`.
    ///
    /// Used for `INSERT ... RETURNING id`.
    fn query_id(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<i64>> + Send {
        async move {
            let row = self.query_one(sql, params).await?;
            row.try_get(0).map_err(|e| OrmError::decode("0", e.to_string()))
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Run one or more statements without parameters over the simple query protocol.
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = OrmResult<()>> + Send;

    /// Release the handle's resources. Plain connections close when dropped, so the
    /// default is a no-op.
    fn close(&self) {}
}

impl DbHandle for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

impl DbHandle for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Transaction::batch_execute(self, sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl DbHandle for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        // Delegate to the deref target (tokio_postgres::Client).
        DbHandle::query(&***self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        DbHandle::execute(&***self, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        DbHandle::batch_execute(&***self, sql).await
    }
}

/// Each call checks a client out of the pool for the duration of one statement.
#[cfg(feature = "pool")]
impl DbHandle for deadpool_postgres::Pool {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        let client = self.get().await?;
        DbHandle::query(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        let client = self.get().await?;
        DbHandle::execute(&client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        let client = self.get().await?;
        DbHandle::batch_execute(&client, sql).await
    }

    fn close(&self) {
        deadpool_postgres::Pool::close(self);
    }
}
