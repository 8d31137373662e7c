//! Statement text with bound values.
//!
//! [`Sql`] grows a statement left to right. Every bound value is written as the next
//! `$n` placeholder at the moment it is pushed, so the text and the value list can
//! never disagree and no renumbering pass is needed before execution.
//!
//! # Example
//!
//! ```ignore
//! use tagorm::sql;
//!
//! let mut q = sql(r#"SELECT users.id AS "users.id" FROM users WHERE users.status = "#);
//! q.push_bind("active").push(" ORDER BY users.id").limit(10);
//! assert_eq!(q.as_str(), r#"SELECT users.id AS "users.id" FROM users WHERE users.status = $1 ORDER BY users.id LIMIT $2"#);
//!
//! let rows = q.fetch_all(&client).await?;
//! ```

use crate::client::DbHandle;
use crate::condition::Condition;
use crate::error::OrmResult;
use crate::ident::Ident;
use crate::row::FromRow;
use crate::value::Value;
use std::fmt::Write;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A statement under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    text: String,
    params: Vec<Value>,
}

/// Shorthand for [`Sql::new`].
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

impl Sql {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            text: initial_sql.into(),
            params: Vec::new(),
        }
    }

    /// Append literal SQL text.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.text.push_str(fragment);
        self
    }

    /// Bind `value` as the next `$n` placeholder.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        let _ = write!(self.text, "${}", self.params.len());
        self
    }

    /// Bind each value, separated by `, `. Nothing bound renders `NULL`, which keeps
    /// `IN (...)` and `VALUES (...)` syntactically valid.
    pub fn push_bind_list<T>(&mut self, values: impl IntoIterator<Item = T>) -> &mut Self
    where
        T: Into<Value>,
    {
        let before = self.params.len();
        for value in values {
            if self.params.len() > before {
                self.text.push_str(", ");
            }
            self.push_bind(value);
        }
        if self.params.len() == before {
            self.text.push_str("NULL");
        }
        self
    }

    /// Append `ident` after checking it is a plain or quoted, optionally qualified name.
    pub fn push_ident(&mut self, ident: &str) -> OrmResult<&mut Self> {
        let ident = Ident::parse(ident)?;
        Ok(self.push(ident.as_str()))
    }

    pub fn push_condition(&mut self, condition: &Condition) -> &mut Self {
        condition.append_to_sql(self);
        self
    }

    /// ` WHERE c1 AND c2 ...`; nothing at all for an empty slice.
    pub fn push_where_and(&mut self, conditions: &[Condition]) -> &mut Self {
        let mut keyword = " WHERE ";
        for condition in conditions {
            self.push(keyword).push_condition(condition);
            keyword = " AND ";
        }
        self
    }

    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.push(" LIMIT ").push_bind(n)
    }

    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.push(" OFFSET ").push_bind(n)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_sql(&self) -> String {
        self.text.clone()
    }

    /// Bound values; `params()[i]` belongs to placeholder `$(i + 1)`.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Values as the trait objects `tokio-postgres` expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
    }

    /// Values rendered as SQL literals, for statement logging.
    pub fn param_literals(&self) -> Vec<String> {
        self.params.iter().map(Value::to_literal).collect()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.text, self.params)
    }

    // ==================== Execution ====================

    pub async fn fetch_all(&self, conn: &impl DbHandle) -> OrmResult<Vec<Row>> {
        conn.query(&self.text, &self.params_ref()).await
    }

    /// Run and decode every row as `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl DbHandle) -> OrmResult<Vec<T>> {
        self.fetch_all(conn)
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// First row; [`NotFound`](crate::OrmError::NotFound) when there is none.
    pub async fn fetch_one(&self, conn: &impl DbHandle) -> OrmResult<Row> {
        conn.query_one(&self.text, &self.params_ref()).await
    }

    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl DbHandle) -> OrmResult<T> {
        T::from_row(&self.fetch_one(conn).await?)
    }

    /// First column of the first row as an `i64`, as returned by `RETURNING id`.
    pub async fn fetch_id(&self, conn: &impl DbHandle) -> OrmResult<i64> {
        conn.query_id(&self.text, &self.params_ref()).await
    }

    /// Run and return the affected row count.
    pub async fn execute(&self, conn: &impl DbHandle) -> OrmResult<u64> {
        conn.execute(&self.text, &self.params_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_number_as_values_are_pushed() {
        let mut q = sql("UPDATE t SET a = ");
        q.push_bind(1_i32).push(", b = ").push_bind("x").push(" WHERE id = ").push_bind(9_i64);

        assert_eq!(q.as_str(), "UPDATE t SET a = $1, b = $2 WHERE id = $3");
        assert_eq!(q.params(), &[Value::Int4(1), Value::from("x"), Value::Int8(9)]);
        assert_eq!(q.params_ref().len(), 3);
    }

    #[test]
    fn bind_list_separates_values() {
        let mut q = sql("INSERT INTO t (a, b, c) VALUES (");
        q.push_bind_list(["x", "y", "z"]).push(")");
        assert_eq!(q.as_str(), "INSERT INTO t (a, b, c) VALUES ($1, $2, $3)");
    }

    #[test]
    fn empty_bind_list_renders_null() {
        let mut q = sql("SELECT 1 WHERE 2 IN (");
        q.push_bind_list(Vec::<i64>::new()).push(")");
        assert_eq!(q.as_str(), "SELECT 1 WHERE 2 IN (NULL)");
        assert!(q.params().is_empty());
    }

    #[test]
    fn identifiers_are_checked_before_use() {
        let mut q = sql("DELETE FROM ");
        assert!(q.push_ident("public.orders").is_ok());
        assert!(q.push_ident("orders; --").is_err());
        assert_eq!(q.as_str(), "DELETE FROM public.orders");
    }

    #[test]
    fn where_clause_joins_with_and() {
        let mut q = sql("SELECT 1 FROM orders");
        q.push_where_and(&[
            Condition::gt("orders.total", 10_i64).unwrap(),
            Condition::is_null("orders.deleted_at").unwrap(),
        ]);
        assert_eq!(
            q.as_str(),
            "SELECT 1 FROM orders WHERE orders.total > $1 AND orders.deleted_at IS NULL"
        );

        let mut q = sql("SELECT 1 FROM orders");
        q.push_where_and(&[]);
        assert_eq!(q.as_str(), "SELECT 1 FROM orders");
    }

    #[test]
    fn paging_is_bound() {
        let mut q = sql("SELECT 1");
        q.limit(25).offset(50);
        assert_eq!(q.as_str(), "SELECT 1 LIMIT $1 OFFSET $2");
        assert_eq!(q.params(), &[Value::Int8(25), Value::Int8(50)]);
    }

    #[test]
    fn literals_for_logging() {
        let mut q = sql("UPDATE t SET a = ");
        q.push_bind("it's").push(", b = ").push_bind(None::<i64>);
        assert_eq!(q.param_literals(), vec!["'it''s'".to_string(), "NULL".to_string()]);

        let (text, params) = q.into_parts();
        assert_eq!(text, "UPDATE t SET a = $1, b = $2");
        assert_eq!(params.len(), 2);
    }
}
