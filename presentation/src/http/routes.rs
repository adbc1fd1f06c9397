//! HTTP routes for deliberations and responder health
//!
//! Every route except `/health` needs a caller identity. A `no_consensus`
//! or `insufficient_responses` outcome is a normal 200 response.

use super::auth::{Action, Caller, authorize};
use super::dto::{
    CreateDeliberationRequest, DeliberationResponse, HealthResponse, ListParams, ListResponse,
};
use super::error::ApiError;
use super::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use council_application::DeliberationRepository;
use council_domain::{DeliberationFlag, DeliberationId, EvidenceTrail, FlagRequest};
use tracing::info;

pub fn router<R: DeliberationRepository + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route(
            "/deliberations",
            post(create_deliberation::<R>).get(list_deliberations::<R>),
        )
        .route("/deliberations/{id}", get(get_deliberation::<R>))
        .route("/deliberations/{id}/evidence", get(get_evidence::<R>))
        .route("/deliberations/{id}/flag", post(flag_deliberation::<R>))
        .route("/health", get(health::<R>))
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<DeliberationId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid deliberation id: {}", raw)))
}

/// POST /deliberations
pub async fn create_deliberation<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    body: Result<Json<CreateDeliberationRequest>, JsonRejection>,
) -> Result<Json<DeliberationResponse>, ApiError> {
    let caller = Caller::from_headers(&headers)?;
    authorize(state.policy.as_ref(), &caller, Action::Create)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    info!("Deliberation requested by {}", caller.requester_id);
    let result = state
        .deliberate
        .execute(request.into_input(caller.requester_id))
        .await?;
    Ok(Json(result.into()))
}

/// GET /deliberations
pub async fn list_deliberations<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let caller = Caller::from_headers(&headers)?;
    let viewer = authorize(state.policy.as_ref(), &caller, Action::List)?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let page = state.access.list(&viewer, &params.to_filter()?).await?;
    Ok(Json(page.into()))
}

/// GET /deliberations/{id}
pub async fn get_deliberation<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeliberationResponse>, ApiError> {
    let caller = Caller::from_headers(&headers)?;
    let viewer = authorize(state.policy.as_ref(), &caller, Action::Read)?;
    let result = state.access.get(&viewer, parse_id(&id)?).await?;
    Ok(Json(result.into()))
}

/// GET /deliberations/{id}/evidence
pub async fn get_evidence<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<EvidenceTrail>, ApiError> {
    let caller = Caller::from_headers(&headers)?;
    let viewer = authorize(state.policy.as_ref(), &caller, Action::Read)?;
    let trail = state.access.evidence(&viewer, parse_id(&id)?).await?;
    Ok(Json(trail))
}

/// POST /deliberations/{id}/flag
pub async fn flag_deliberation<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<DeliberationFlag>, ApiError> {
    let caller = Caller::from_headers(&headers)?;
    let viewer = authorize(state.policy.as_ref(), &caller, Action::Flag)?;
    let id = parse_id(&id)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let flag = state.access.flag(&viewer, id, request).await?;
    Ok(Json(flag))
}

/// GET /health
pub async fn health<R: DeliberationRepository + 'static>(
    State(state): State<AppState<R>>,
) -> Json<HealthResponse> {
    Json(state.monitor.summary().into())
}
