use super::parse_code;
use crate::error::Result;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use pinhole_core::{Resolution, ShortenerError, Visit};
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

const FORWARDED_FOR: &str = "x-forwarded-for";

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// The first hop of `X-Forwarded-For` when it is an IP address, else the
/// peer address.
fn source(request: &Request) -> Option<String> {
    header_value(request.headers(), FORWARDED_FOR)
        .and_then(|chain| forwarded_hop(&chain))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

fn forwarded_hop(chain: &str) -> Option<String> {
    let hop = chain.split(',').next()?.trim();
    match hop.parse::<IpAddr>() {
        Ok(ip) => Some(ip.to_string()),
        Err(_) => {
            let hop: String = hop.chars().take(64).collect();
            debug!(%hop, "ignoring forwarded hop that is not an ip address");
            None
        }
    }
}

fn capture_visit(request: &Request) -> Visit {
    let headers = request.headers();
    Visit {
        referrer: header_value(headers, header::REFERER),
        user_agent: header_value(headers, header::USER_AGENT),
        source: source(request),
        at: jiff::Timestamp::now(),
    }
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    request: Request,
) -> Result<Response> {
    let code = parse_code(&short_code)?;
    let visit = capture_visit(&request);

    match state.redirector.resolve(&code, Some(visit)).await? {
        Resolution::Redirect(url) => {
            Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
        }
        Resolution::NotFound => Err(ShortenerError::NotFound(short_code).into()),
        Resolution::Expired => Err(ShortenerError::Expired(short_code).into()),
    }
}
