use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::get,
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::database::Database;
use crate::error::ApiError;
use crate::handlers::{root, table, AppState, TableContext};
use crate::middleware::response_time;
use crate::table::TableRegistry;

/// Top-level paths a table router may not shadow.
const RESERVED_PATHS: [&str; 1] = ["health"];

/// Build the full router: process routes, one nested router per table, and
/// the global middleware stack.
pub fn app(db: Arc<dyn Database>, tables: TableRegistry, config: &AppConfig) -> Router {
    let tables = Arc::new(tables);
    let state = AppState {
        db: db.clone(),
        tables: tables.clone(),
        project_name: config.server.project_name.clone(),
        started: Instant::now(),
    };

    let mut router = Router::new()
        .route("/", get(root::root))
        .route("/health", get(root::health))
        .with_state(state);

    for interface in tables.iter() {
        if RESERVED_PATHS.contains(&interface.name()) {
            warn!(table = %interface.name(), "table name collides with a reserved route; not exposed");
            continue;
        }
        let ctx = TableContext {
            db: db.clone(),
            table: interface.clone(),
            enable_dump_route: config.api.enable_dump_route,
        };
        router = router.nest(&format!("/{}", interface.name()), table::router(ctx));
    }

    let router = router
        .fallback(root::fallback)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(Duration::from_secs(config.server.request_timeout_secs)),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(middleware::from_fn(response_time));

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security.cors_origins))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

async fn handle_timeout(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::RequestTimeout("Request timed out".to_string())
    } else {
        tracing::error!("Unhandled middleware error: {}", err);
        ApiError::InternalServerError("Unhandled internal error".to_string())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
