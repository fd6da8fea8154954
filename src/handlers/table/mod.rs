//! Per-table routes. Each exposed table gets its own router, nested under
//! `/<table>`, whose state carries that table's interface.

pub mod params;
pub mod read;
pub mod write;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::database::Database;
use crate::table::TableInterface;

pub use params::RequestParams;

#[derive(Clone)]
pub struct TableContext {
    pub db: Arc<dyn Database>,
    pub table: Arc<TableInterface>,
    pub enable_dump_route: bool,
}

impl TableContext {
    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }
}

pub fn router(ctx: TableContext) -> Router {
    Router::new()
        .route("/", get(read::list))
        .route("/data", get(read::data))
        .route("/count", get(read::count))
        .route("/schema", get(read::schema))
        .route("/order", get(read::order))
        .route("/query", get(read::query))
        .route("/all", get(read::all))
        .route("/find/:id", get(read::find))
        .route("/:id", get(read::record))
        .route("/create", post(write::create))
        .route("/update/:id", post(write::update))
        .route("/delete/:id", post(write::delete))
        .with_state(ctx)
}
