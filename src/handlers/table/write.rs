use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
};
use serde_json::{json, Value};

use crate::error::{ApiError, OperationContext};
use crate::filter::FieldUpdate;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Operation;

use super::params::json_object;
use super::TableContext;

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// POST /<table>/create - body `{"record": {...}}`
pub async fn create(State(ctx): State<TableContext>, body: Result<Bytes, BytesRejection>) -> ApiResult<Value> {
    let op = Operation::CreateRecord;
    let mut body = json_object(op, body)?;
    let record = match body.remove("record") {
        Some(Value::Object(record)) => record,
        _ => return Err(ApiError::bad_request(format!("{} failed: body must contain a record object", op))),
    };

    let created = ctx.table.create_record(ctx.db(), record).await.during(op)?;
    Ok(ApiResponse::success(json!([{ "id": created.id }]))
        .with_message(format!("Created record with id: {}", created.id)))
}

/// POST /<table>/update/:id - body `{"updates": [{"field": .., "value": ..}]}`
pub async fn update(
    State(ctx): State<TableContext>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Value> {
    let op = Operation::UpdateRecord;
    let body = json_object(op, body)?;
    let updates = FieldUpdate::parse_list(body.get("updates")).during(op)?;

    let affected = ctx.table.update_record(ctx.db(), &id, &updates).await.during(op)?;
    Ok(ApiResponse::success(json!([{ "affected_rows": affected }]))
        .with_message(format!("Updated {} record{} with id: {}", affected, plural(affected), id)))
}

/// POST /<table>/delete/:id
pub async fn delete(State(ctx): State<TableContext>, Path(id): Path<String>) -> ApiResult<()> {
    let affected = ctx.table.delete_record(ctx.db(), &id).await.during(Operation::DeleteRecord)?;
    Ok(ApiResponse::message(format!("Deleted {} record{} with id: {}", affected, plural(affected), id)))
}
