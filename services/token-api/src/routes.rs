//! Token API routes
//!
//! Endpoints:
//! - GET    /tokens                 — list, scoped to the caller, paginated
//! - GET    /tokens/new             — blank-form metadata for allowed types
//! - POST   /tokens                 — create; returns the secret exactly once
//! - GET    /tokens/:id             — metadata (never the secret)
//! - PATCH  /tokens/:id             — update name / workflow SCM credential
//! - POST   /tokens/:id/regenerate  — new secret, disclosed exactly once
//! - DELETE /tokens/:id             — destroy
//! - GET    /health, GET /metrics
//!
//! The authenticated principal arrives as the `x-auth-user` header, set
//! by the fronting identity layer. Every per-token handler looks the
//! record up first (404 for a missing id), then runs the permit check
//! (generic 403 for a foreign token) before touching anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::warn;

use token_core::{
    Action, CreateRequest, PackageDirectory, TokenRecord, TokenStore, UpdateRequest, lifecycle,
    permit, scope,
};

use crate::error::ApiError;
use crate::metrics;

/// Header carrying the authenticated principal.
const AUTH_HEADER: &str = "x-auth-user";

const DEFAULT_PER_PAGE: usize = 25;
const MAX_PER_PAGE: usize = 100;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TokenStore>,
    pub registry: Arc<PackageDirectory>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
    pub requests_total: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        store: Arc<TokenStore>,
        registry: Arc<PackageDirectory>,
        prometheus: PrometheusHandle,
    ) -> Self {
        Self {
            store,
            registry,
            prometheus,
            started_at: Instant::now(),
            requests_total: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Build the axum router with all token endpoints and shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tokens", get(list_tokens).post(create_token))
        .route("/tokens/new", get(new_token_form))
        .route(
            "/tokens/{id}",
            get(show_token).patch(update_token).delete(destroy_token),
        )
        .route("/tokens/{id}/regenerate", post(regenerate_token))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_request,
        ))
        .with_state(state)
}

/// Count every request and record its duration/status.
async fn track_request(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.requests_total.fetch_add(1, Ordering::Relaxed);
    metrics::record_request(response.status().as_u16(), start.elapsed().as_secs_f64());
    response
}

/// Extract the authenticated principal from the request headers.
fn principal(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthenticated)
}

/// Look up a token and gate the requested action: 404 before 403, and a
/// 403 that names nothing about the record.
async fn authorized_token(
    state: &AppState,
    requester: &str,
    id: &str,
    action: Action,
) -> Result<TokenRecord, ApiError> {
    let token = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound("token not found".into()))?;
    if !permit(requester, action, &token) {
        warn!(id, requester, ?action, "permit denied");
        return Err(ApiError::Forbidden);
    }
    Ok(token)
}

/// Token metadata as exposed over the API. Never the secret, its hash,
/// or the SCM credential value.
fn token_json(record: &TokenRecord) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": record.id,
        "type": record.kind.as_str(),
        "name": record.name,
        "owner": record.owner,
    });
    if let Some(package) = &record.package {
        value["project"] = package.project.clone().into();
        value["package"] = package.package.clone().into();
    }
    value
}

fn json_response(
    status: StatusCode,
    body: serde_json::Value,
) -> (StatusCode, [(axum::http::HeaderName, &'static str); 1], String) {
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

#[derive(Deserialize)]
struct Pagination {
    page: Option<usize>,
    per_page: Option<usize>,
}

/// GET /tokens — the caller's tokens, store order, paginated.
async fn list_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;

    let owned = state.store.list_owned_by(&requester).await;
    let scoped = scope(&requester, owned);

    let page = pagination.page.unwrap_or(1).max(1);
    let per_page = pagination
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let total = scoped.len();
    let tokens: Vec<serde_json::Value> = scoped
        .iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .map(token_json)
        .collect();

    Ok(json_response(
        StatusCode::OK,
        serde_json::json!({
            "tokens": tokens,
            "page": page,
            "per_page": per_page,
            "total": total,
        }),
    ))
}

/// GET /tokens/new — the allowed types and their type-specific fields.
async fn new_token_form(headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    principal(&headers)?;

    Ok(json_response(
        StatusCode::OK,
        serde_json::json!({
            "types": [
                {
                    "type": "generic",
                    "fields": ["name", "project_name", "package_name"],
                },
                {
                    "type": "workflow",
                    "fields": ["name", "scm_token"],
                },
            ]
        }),
    ))
}

#[derive(Deserialize)]
struct CreateBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    scm_token: Option<String>,
    project_name: Option<String>,
    package_name: Option<String>,
}

/// POST /tokens — create a token; the secret appears in this response
/// and never again.
async fn create_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;

    let request = CreateRequest {
        kind: body.kind,
        name: body.name,
        scm_token: body.scm_token,
        project_name: body.project_name,
        package_name: body.package_name,
    };

    let created = lifecycle::create(&state.store, state.registry.as_ref(), &requester, request)
        .await?;
    metrics::record_operation("create");

    Ok(json_response(
        StatusCode::CREATED,
        serde_json::json!({
            "id": created.token.id,
            "type": created.token.kind.as_str(),
            "name": created.token.name,
            "secret": created.secret.expose(),
        }),
    ))
}

/// GET /tokens/:id — metadata only, owner only.
async fn show_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;
    let token = authorized_token(&state, &requester, &id, Action::View).await?;
    Ok(json_response(StatusCode::OK, token_json(&token)))
}

#[derive(Deserialize)]
struct UpdateBody {
    name: Option<String>,
    scm_token: Option<String>,
}

/// PATCH /tokens/:id — rename, and for workflow tokens replace the SCM
/// credential. Anything else on the record is immutable here.
async fn update_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    axum::Json(body): axum::Json<UpdateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;
    let token = authorized_token(&state, &requester, &id, Action::Update).await?;

    let updated = lifecycle::update(
        &state.store,
        token,
        UpdateRequest {
            name: body.name,
            scm_token: body.scm_token,
        },
    )
    .await?;
    metrics::record_operation("update");

    Ok(json_response(StatusCode::OK, token_json(&updated)))
}

/// POST /tokens/:id/regenerate — replace the secret, disclose it once.
async fn regenerate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;
    let token = authorized_token(&state, &requester, &id, Action::Update).await?;

    let secret = lifecycle::regenerate(&state.store, token).await?;
    metrics::record_operation("regenerate");

    Ok(json_response(
        StatusCode::OK,
        serde_json::json!({ "id": id, "secret": secret.expose() }),
    ))
}

/// DELETE /tokens/:id — remove the record entirely.
async fn destroy_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = principal(&headers)?;
    let token = authorized_token(&state, &requester, &id, Action::Destroy).await?;

    lifecycle::destroy(&state.store, &token).await?;
    metrics::record_operation("destroy");

    Ok(json_response(
        StatusCode::OK,
        serde_json::json!({ "id": id, "status": "deleted" }),
    ))
}

/// GET /health — service status, token count, uptime, requests served.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "tokens_total": state.store.len().await,
            "uptime_seconds": state.started_at.elapsed().as_secs(),
            "requests_served": state.requests_total.load(Ordering::Relaxed),
        }),
    )
}

/// GET /metrics — Prometheus text exposition format.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
