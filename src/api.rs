// 🌐 REST API with Axum
// Thin transport over QueryService: typed errors become status codes here and nowhere else

use crate::aggregation::ReportResult;
use crate::error::QueryError;
use crate::service::{CustomerPage, CustomerProfile, QueryService, ReportIndex};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::collections::HashMap;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
}

impl AppState {
    pub fn new(service: QueryService) -> Self {
        Self { service }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub code: String,
    pub message: String,
}

/// QueryError on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err)
    }
}

pub fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::NotFound(_) | QueryError::ReportNotFound(_) => StatusCode::NOT_FOUND,
        QueryError::InvalidFilterValue { .. } | QueryError::InvalidPaginationParameter { .. } => {
            StatusCode::BAD_REQUEST
        }
        QueryError::DataUnavailable(_) | QueryError::SchemaViolation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Query failed");
        }

        let body = ErrorResponse {
            error: true,
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/customers - Filtered, paginated collection
async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<CustomerPage>, ApiError> {
    Ok(Json(state.service.list_customers(&params)?))
}

/// GET /api/customers/:id - One customer with nested sections
async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> Result<Json<CustomerProfile>, ApiError> {
    Ok(Json(state.service.get_customer(customer_id)?))
}

/// GET /api/analytics - Report catalog
async fn list_reports(State(state): State<AppState>) -> Json<ReportIndex> {
    Json(state.service.list_reports())
}

/// GET /api/analytics/:id - Run one report
async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<i64>,
) -> Result<Json<ReportResult>, ApiError> {
    Ok(Json(state.service.run_report(report_id)?))
}

/// Build the full router with `/api` routes, tracing and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/customers", get(list_customers))
        .route("/customers/:id", get(get_customer))
        .route("/analytics", get(list_reports))
        .route("/analytics/:id", get(get_report))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::create_test_store;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_app() -> Router {
        let service = QueryService::new(Arc::new(create_test_store()));
        create_router(AppState::new(service))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_list_customers_envelope() {
        let (status, body) = get_json("/api/customers?geography=France&exited=1&per_page=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource"], "customers");
        assert_eq!(body["total_items"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["per_page"], 1);
        assert_eq!(body["data"][0]["surname"], "Hargrave");
    }

    #[tokio::test]
    async fn test_exited_out_of_range_and_empty_page_are_200() {
        let (status, body) = get_json("/api/customers?exited=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_items"], 0);

        let (status, body) = get_json("/api/customers?page=&per_page=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_page"], 1);
        assert_eq!(body["per_page"], 10);
    }

    #[tokio::test]
    async fn test_bad_query_params_are_400() {
        let (status, body) = get_json("/api/customers?exited=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FILTER_VALUE");

        let (status, body) = get_json("/api/customers?page=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_PAGINATION_PARAMETER");
    }

    #[tokio::test]
    async fn test_get_customer() {
        let (status, body) = get_json("/api/customers/15619304").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["identity"]["id"], 15619304);
        assert_eq!(body["financial_status"]["products_count"], 3);
        assert_eq!(body["bank_relation"]["tenure"], 8);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_404() {
        let (status, body) = get_json("/api/customers/42").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reports() {
        let (status, body) = get_json("/api/analytics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available_reports"].as_array().unwrap().len(), 5);

        let (status, body) = get_json("/api/analytics/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report_id"], 1);
        assert_eq!(body["meta"]["description"], "Churn rate by geography and gender");
        assert!(body["results"][0].get("churn_rate").is_some());
    }

    #[tokio::test]
    async fn test_unknown_report_is_404() {
        for uri in ["/api/analytics/6", "/api/analytics/0"] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["code"], "REPORT_NOT_FOUND");
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&QueryError::NotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&QueryError::ReportNotFound(9)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&QueryError::SchemaViolation("broken".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
