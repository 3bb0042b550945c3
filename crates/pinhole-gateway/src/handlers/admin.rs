use crate::error::Result;
use crate::model::CleanupRequest;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use jiff::Timestamp;
use pinhole_core::CleanupReport;

pub async fn cleanup_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<CleanupReport>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.admin.authorize(authorization)?;

    let report = state.sweeper.sweep(request.action, Timestamp::now()).await?;
    Ok(Json(report))
}
