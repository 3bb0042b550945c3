use super::parse_code;
use crate::error::Result;
use crate::model::{CreateUrlRequest, CreateUrlResponse, RecentQuery, UrlStatusResponse, UrlSummary};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::{Lookup, ShortenerError};
use pinhole_shortener::config::DEFAULT_RECENT_LIMIT;

pub const OWNER_HEADER: &str = "x-owner-id";

pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<Response> {
    let link = state.shortener.shorten(request.into()).await?;
    let body = CreateUrlResponse::new(link, &state.base_url);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlStatusResponse>> {
    let code = parse_code(&short_code)?;
    match state.shortener.status(&code).await? {
        Lookup::Found(status) => Ok(Json(UrlStatusResponse::new(status, &state.base_url))),
        Lookup::NotFound => Err(ShortenerError::NotFound(short_code).into()),
    }
}

pub async fn delete_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let code = parse_code(&short_code)?;
    let owner = headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if state.shortener.delete(&code, owner).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ShortenerError::NotFound(short_code).into())
    }
}

pub async fn recent_urls_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<UrlSummary>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let links = state.shortener.recent(limit).await?;
    Ok(Json(
        links
            .into_iter()
            .map(|link| UrlSummary::new(link, &state.base_url))
            .collect(),
    ))
}
