#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use narnia_api::config::{AppConfig, Environment};
use narnia_api::database::{Database, DatabaseError, ExecResult, SqlQuery};
use narnia_api::table::{TableOptions, TableRegistry};
use narnia_api::types::Record;

pub enum Reply {
    Rows(Vec<Value>),
    Exec { affected: u64, insert_id: u64 },
    Fail(&'static str),
}

/// In-memory database answering statements from a script, in order.
#[derive(Default)]
pub struct ScriptedDatabase {
    replies: Mutex<VecDeque<Reply>>,
    log: Mutex<Vec<SqlQuery>>,
}

impl ScriptedDatabase {
    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn rows(&self, rows: Vec<Value>) {
        self.push(Reply::Rows(rows));
    }

    pub fn exec(&self, affected: u64, insert_id: u64) {
        self.push(Reply::Exec { affected, insert_id });
    }

    pub fn fail(&self, message: &'static str) {
        self.push(Reply::Fail(message));
    }

    pub fn statements(&self) -> Vec<SqlQuery> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    fn next(&self, query: &SqlQuery) -> Result<Reply, DatabaseError> {
        self.log.lock().unwrap().push(query.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Fail(message)) => Err(DatabaseError::QueryError(message.to_string())),
            Some(reply) => Ok(reply),
            None => Err(DatabaseError::QueryError(format!("unscripted statement: {}", query.sql))),
        }
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Record>, DatabaseError> {
        match self.next(query)? {
            Reply::Rows(rows) => Ok(rows.into_iter().filter_map(|r| r.as_object().cloned()).collect()),
            _ => Err(DatabaseError::QueryError("expected a row-returning statement".into())),
        }
    }

    async fn execute(&self, query: &SqlQuery) -> Result<ExecResult, DatabaseError> {
        match self.next(query)? {
            Reply::Exec { affected, insert_id } => Ok(ExecResult { rows_affected: affected, last_insert_id: insert_id }),
            _ => Err(DatabaseError::QueryError("expected a modifying statement".into())),
        }
    }
}

fn column(name: &str, ty: &str, default: Option<&str>, key: &str, extra: &str) -> Value {
    json!({
        "column_name": name,
        "column_type": ty,
        "is_nullable": "NO",
        "column_default": default,
        "column_key": key,
        "extra": extra,
    })
}

/// `users(id, email, password, first_name, last_name, created_at)`
pub fn users_columns() -> Vec<Value> {
    vec![
        column("id", "int(11)", None, "PRI", "auto_increment"),
        column("email", "varchar(255)", None, "UNI", ""),
        column("password", "varchar(255)", None, "", ""),
        column("first_name", "varchar(50)", None, "", ""),
        column("last_name", "varchar(50)", None, "", ""),
        column("created_at", "timestamp", Some("CURRENT_TIMESTAMP"), "", "DEFAULT_GENERATED"),
    ]
}

pub fn user(id: i64, email: &str) -> Value {
    json!({ "id": id, "email": email, "first_name": "Ada", "last_name": "Lovelace" })
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<ScriptedDatabase>,
}

/// Router over a single `users` table holding `initial_count` rows.
pub async fn users_app(initial_count: i64) -> Result<TestApp> {
    users_app_with(initial_count, |_| {}).await
}

pub async fn users_app_with(initial_count: i64, tweak: impl FnOnce(&mut AppConfig)) -> Result<TestApp> {
    let mut config = AppConfig::defaults(Environment::Development);
    config.api.enable_request_logging = false;
    tweak(&mut config);

    let db = Arc::new(ScriptedDatabase::default());
    db.rows(vec![json!({ "table_name": "users" })]);
    db.rows(users_columns());
    db.rows(vec![json!({ "count": initial_count })]);

    let options = TableOptions { page_size: config.api.page_size, bcrypt_cost: 4 };
    let tables = TableRegistry::discover(db.as_ref(), options, None)
        .await
        .context("table discovery")?;
    db.clear();

    let router = narnia_api::app(db.clone(), tables, &config);
    Ok(TestApp { router, db })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Method::GET, uri, Body::empty()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, Body::from(body.to_string())).await
    }

    pub async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> Result<TestResponse> {
        self.send(Method::POST, uri, body.into()).await
    }

    async fn send(&self, method: Method, uri: &str, body: Body) -> Result<TestResponse> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)?;
        let response = self.router.clone().oneshot(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok(TestResponse { status, headers, body })
    }
}
