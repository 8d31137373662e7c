//! In-memory `DbHandle` that records every statement it is asked to run.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tagorm::tokio_postgres::Row;
use tagorm::tokio_postgres::types::ToSql;
use tagorm::{DbHandle, OrmError, OrmResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub sql: String,
    /// `Debug` rendering of each bound parameter.
    pub params: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecordingHandle {
    calls: Mutex<Vec<Call>>,
    closed: AtomicBool,
    next_id: i64,
    affected: u64,
    fail: bool,
}

impl RecordingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement fails with a driver-like error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.next_id = id;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, method: &'static str, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<()> {
        self.calls.lock().unwrap().push(Call {
            method,
            sql: sql.to_string(),
            params: params.iter().map(|p| format!("{p:?}")).collect(),
        });
        if self.fail {
            return Err(OrmError::Other("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

impl DbHandle for RecordingHandle {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
        self.record("query", sql, params)?;
        Ok(Vec::new())
    }

    async fn query_id(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<i64> {
        self.record("query_id", sql, params)?;
        Ok(self.next_id)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
        self.record("execute", sql, params)?;
        Ok(self.affected)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.record("batch_execute", sql, &[])
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
