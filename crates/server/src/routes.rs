use axum::{
    extract::State,
    http::HeaderValue,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use retrieval_core::config::{Secret, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer;
use crate::errors::ApiError;
use crate::extract::ApiJson;
use crate::models::{DeleteRequest, Document, Query, QueryResult, StatusResponse};
use crate::service::{DeleteOutcome, RetrievalService};

/// Origins allowed to call the API with credentials in development.
pub const DEV_ORIGINS: [&str; 2] = ["http://localhost:8000", "https://chat.openai.com"];

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RetrievalService>,
    pub bearer_token: Arc<Secret>,
}

impl AppState {
    pub fn new(service: RetrievalService, bearer_token: Secret) -> Self {
        Self {
            service: Arc::new(service),
            bearer_token: Arc::new(bearer_token),
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({"Hello": "World"}))
}

async fn upsert_document(
    State(state): State<AppState>,
    ApiJson(document): ApiJson<Document>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.service.upsert(document).await?;
    Ok(Json(StatusResponse::ok()))
}

async fn query_documents(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<Query>,
) -> Result<Json<Vec<QueryResult>>, ApiError> {
    let results = state.service.query(query).await?;
    Ok(Json(results))
}

async fn delete_document(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DeleteRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let response = match state.service.delete(request).await? {
        DeleteOutcome::Deleted => StatusResponse::ok(),
        DeleteOutcome::NotFound => StatusResponse::not_found(),
    };
    Ok(Json(response))
}

fn dev_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(DEV_ORIGINS.map(HeaderValue::from_static))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

pub fn create_app(state: AppState, server: &ServerConfig) -> Router {
    // Bearer check runs before the body is extracted
    let protected = Router::new()
        .route("/upsert", post(upsert_document))
        .route("/query", post(query_documents))
        .route("/delete", post(delete_document))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let app = Router::new()
        .route("/", get(root))
        .merge(protected)
        .nest_service("/.well-known", ServeDir::new(&server.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if server.is_development() {
        app.layer(dev_cors_layer())
    } else {
        app
    }
}
