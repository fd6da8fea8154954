//! The seam between table interfaces and the SQL client.
//!
//! Everything above this module speaks in [`SqlQuery`] values: SQL text with
//! `?` placeholders plus the values bound to them, in order.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlPool};
use sqlx::types::Json;
use sqlx::MySql;

use crate::config::DatabaseConfig;
use crate::database::manager::DatabaseError;
use crate::database::row::row_to_record;
use crate::types::Record;

/// Parameterized statement. Values never appear in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), params: vec![] }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self { sql: sql.into(), params }
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement that returns rows.
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Record>, DatabaseError>;

    /// Run INSERT / UPDATE / DELETE.
    async fn execute(&self, query: &SqlQuery) -> Result<ExecResult, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.fetch_all(&SqlQuery::new("SELECT 1")).await.map(|_| ())
    }
}

/// [`Database`] over a shared sqlx MySQL pool.
#[derive(Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
    enable_query_logging: bool,
    slow_query_threshold: Duration,
}

impl MySqlDatabase {
    pub fn new(pool: MySqlPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            enable_query_logging: config.enable_query_logging,
            slow_query_threshold: Duration::from_millis(config.slow_query_threshold_ms),
        }
    }

    fn log_query(&self, query: &SqlQuery, started: Instant) {
        let elapsed = started.elapsed();
        if self.enable_query_logging {
            tracing::debug!(sql = %query.sql, params = query.params.len(), ?elapsed, "query");
        }
        if elapsed >= self.slow_query_threshold {
            tracing::warn!(sql = %query.sql, ?elapsed, "slow query");
        }
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Record>, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query(&query.sql);
        for p in query.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        self.log_query(query, started);

        rows.iter().map(row_to_record).collect()
    }

    async fn execute(&self, query: &SqlQuery) -> Result<ExecResult, DatabaseError> {
        let started = Instant::now();
        let mut q = sqlx::query(&query.sql);
        for p in query.params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        self.log_query(query, started);

        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, MySql, MySqlArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                q.bind(u)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(Json(v)), // JSON columns
    }
}
