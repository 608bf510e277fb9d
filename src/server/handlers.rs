//! HTTP request handlers.

use std::error::Error as _;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::AppState;
use crate::error::ScrapeError;
use crate::scrapers::Source;

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Registered sources in declaration order.
pub async fn api_sources(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.source_info())
}

/// Query parameters for `/api/scrape`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeParams {
    pub action: Option<String>,
    pub source_id: Option<String>,
    pub query: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

fn bad_request(message: &str) -> Response {
    let body = ErrorBody {
        error: message.to_string(),
        details: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn internal_error(err: &ScrapeError, expose_details: bool) -> Response {
    error!("Scrape request failed: {}", err);

    let details = expose_details.then(|| {
        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        chain
    });
    let body = ErrorBody {
        error: err.to_string(),
        details,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, Response> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| bad_request(message))
}

fn respond<T: Serialize>(result: crate::Result<T>, expose_details: bool) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => internal_error(&e, expose_details),
    }
}

/// Run one source operation: search, novel, chapters or chapter.
pub async fn api_scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    let source_id = match required(&params.source_id, "Invalid or missing sourceId") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let source = match state.registry.create_source(source_id, &state.options) {
        Ok(source) => source,
        Err(ScrapeError::UnknownSource { .. }) => {
            return bad_request("Invalid or missing sourceId")
        }
        Err(e) => return internal_error(&e, state.expose_error_details),
    };

    match run_action(&source, &params, state.expose_error_details).await {
        Ok(response) | Err(response) => response,
    }
}

async fn run_action(
    source: &Source,
    params: &ScrapeParams,
    expose: bool,
) -> Result<Response, Response> {
    let response = match params.action.as_deref() {
        Some("search") => {
            let query = required(&params.query, "Missing query")?;
            respond(source.search_novels(query).await, expose)
        }
        Some("novel") => {
            let url = required(&params.url, "Missing url")?;
            respond(source.get_novel(url).await, expose)
        }
        Some("chapters") => {
            let url = required(&params.url, "Missing url")?;
            respond(source.get_chapter_list(url).await, expose)
        }
        Some("chapter") => {
            let url = required(&params.url, "Missing url")?;
            respond(source.get_chapter(url).await, expose)
        }
        _ => return Err(bad_request("Invalid action")),
    };
    Ok(response)
}
