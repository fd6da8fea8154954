use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::error::{ApiError, OperationContext};
use crate::filter::{ColumnFilter, FilterOrder};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Operation;

use super::{RequestParams, TableContext};

/// GET /<table>?page=N - one page of rows with the cached count
pub async fn list(State(ctx): State<TableContext>, params: RequestParams) -> ApiResult<Value> {
    let op = Operation::GetRecords;
    let page = params.page().during(op)?;
    let page = ctx.table.get_records(ctx.db(), page).await.during(op)?;
    Ok(ApiResponse::success(json!([page.rows, page.total])))
}

/// GET /<table>/data - schema, first page and a fresh count
pub async fn data(State(ctx): State<TableContext>) -> ApiResult<Value> {
    let (rows, total) = ctx.table.get_data(ctx.db()).await.during(Operation::GetData)?;
    Ok(ApiResponse::success(json!([ctx.table.schema(), rows, total])))
}

/// GET /<table>/count
pub async fn count(State(ctx): State<TableContext>) -> ApiResult<Value> {
    let total = ctx.table.count(ctx.db()).await.during(Operation::GetNumRecords)?;
    Ok(ApiResponse::success(json!([total])))
}

/// GET /<table>/schema
pub async fn schema(State(ctx): State<TableContext>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!([ctx.table.schema()])))
}

/// GET /<table>/order?orders={"field":..,"ascending":..}&orders=..&page=N
pub async fn order(State(ctx): State<TableContext>, params: RequestParams) -> ApiResult<Value> {
    let op = Operation::GetOrder;
    let orders = FilterOrder::parse(&params.all("orders")).during(op)?;
    let page = params.page().during(op)?;
    let page = ctx.table.get_ordered_records(ctx.db(), &orders, page).await.during(op)?;
    Ok(ApiResponse::success(json!([page.rows, page.total])))
}

/// GET /<table>/query?column=c&value=v&page=N - equality filter
pub async fn query(State(ctx): State<TableContext>, params: RequestParams) -> ApiResult<Value> {
    let op = Operation::GetQuery;
    let column = params
        .get("column")
        .ok_or_else(|| ApiError::bad_request(format!("{} failed: column is required", op)))?;
    let value = params
        .get("value")
        .ok_or_else(|| ApiError::bad_request(format!("{} failed: value is required", op)))?;

    let filter = ColumnFilter::new(column, value).during(op)?;
    let page = params.page().during(op)?;
    let page = ctx.table.get_records_by_query(ctx.db(), &filter, page).await.during(op)?;
    Ok(ApiResponse::success(json!([page.rows, page.total])))
}

/// GET /<table>/all - unpaginated dump, only when enabled in config
pub async fn all(State(ctx): State<TableContext>) -> ApiResult<Value> {
    let op = Operation::GetAllRecords;
    if !ctx.enable_dump_route {
        return Err(ApiError::forbidden(format!("{} is disabled", op)));
    }
    let rows = ctx.table.get_all_records(ctx.db()).await.during(op)?;
    Ok(ApiResponse::success(json!(rows)))
}

/// GET /<table>/:id
pub async fn record(State(ctx): State<TableContext>, Path(id): Path<String>) -> ApiResult<Value> {
    let rows = ctx.table.get_record_by_id(ctx.db(), &id).await.during(Operation::GetRecord)?;
    Ok(ApiResponse::success(json!(rows)))
}

/// GET /<table>/find/:id?page=N
pub async fn find(
    State(ctx): State<TableContext>,
    Path(id): Path<String>,
    params: RequestParams,
) -> ApiResult<Value> {
    let op = Operation::FindRecords;
    let page = params.page().during(op)?;
    let page = ctx.table.find_records_by_id(ctx.db(), &id, page).await.during(op)?;
    Ok(ApiResponse::success(json!([page.rows, page.total])))
}
