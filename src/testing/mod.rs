//! Scripted [`Database`] for exercising table interfaces and routes without MySQL.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::database::{Database, DatabaseError, ExecResult, SqlQuery};
use crate::types::Record;

#[derive(Debug, Clone)]
pub enum MockReply {
    Rows(Vec<Record>),
    Exec(ExecResult),
    Error(String),
}

/// Answers statements from a queue of replies, in order, and records every
/// statement it receives. An empty queue answers with an error.
#[derive(Debug, Default)]
pub struct MockDatabase {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<SqlQuery>>,
}

impl MockDatabase {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self { replies: Mutex::new(replies.into()), calls: Mutex::default() }
    }

    pub fn push(&self, reply: MockReply) {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
    }

    pub fn calls(&self) -> Vec<SqlQuery> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn pending(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self, query: &SqlQuery) -> Result<MockReply, DatabaseError> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(query.clone());
        match self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            Some(MockReply::Error(message)) => Err(DatabaseError::QueryError(message)),
            Some(reply) => Ok(reply),
            None => Err(DatabaseError::QueryError(format!("no scripted reply for: {}", query.sql))),
        }
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Record>, DatabaseError> {
        match self.next(query)? {
            MockReply::Rows(rows) => Ok(rows),
            other => Err(DatabaseError::QueryError(format!("expected rows for {}, scripted {:?}", query.sql, other))),
        }
    }

    async fn execute(&self, query: &SqlQuery) -> Result<ExecResult, DatabaseError> {
        match self.next(query)? {
            MockReply::Exec(result) => Ok(result),
            other => Err(DatabaseError::QueryError(format!("expected exec for {}, scripted {:?}", query.sql, other))),
        }
    }
}

/// Object literal to [`Record`]; anything else becomes an empty record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// `information_schema.COLUMNS` rows as the schema query returns them:
/// `(name, column_type, default, key, extra, nullable)`.
pub fn describe_rows(columns: &[(&str, &str, Option<&str>, &str, &str, bool)]) -> Vec<Record> {
    columns
        .iter()
        .map(|(name, ty, default, key, extra, nullable)| {
            record(json!({
                "column_name": name,
                "column_type": ty,
                "is_nullable": if *nullable { "YES" } else { "NO" },
                "column_default": default,
                "column_key": key,
                "extra": extra,
            }))
        })
        .collect()
}
