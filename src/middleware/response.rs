use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{success: true, data?, message?}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { data: Some(data), message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Message-only success (no `data` member).
    pub fn message(message: impl Into<String>) -> Self {
        Self { data: None, message: Some(message.into()) }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope { success: true, data: self.data.as_ref(), message: self.message.as_deref() };

        match serde_json::to_value(&envelope) {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to serialize response data",
                        "code": "INTERNAL_SERVER_ERROR"
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn data_envelope() {
        let response = ApiResponse::success(json!([[], 0])).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, json!({"success": true, "data": [[], 0]}));
    }

    #[tokio::test]
    async fn message_envelope_omits_data() {
        let response = ApiResponse::message("Deleted 1 record with id: 3").into_response();
        assert_eq!(body(response).await, json!({"success": true, "message": "Deleted 1 record with id: 3"}));
    }

    #[tokio::test]
    async fn data_and_message_together() {
        let response = ApiResponse::success(json!([{"id": 7}]))
            .with_message("Created record with id: 7")
            .into_response();
        assert_eq!(
            body(response).await,
            json!({"success": true, "data": [{"id": 7}], "message": "Created record with id: 7"})
        );
    }
}
