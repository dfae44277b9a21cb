use askama::Template;
use axum::http::HeaderMap;
use axum::http::header::VARY;
use axum::response::{Html, IntoResponse, Response};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::InternalError;
use crate::models::lookup::{LookupError, LookupState};
use crate::routes::index::render_main;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_weather))
        .with_state(state)
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_weather_json))
        .with_state(state)
}

#[derive(Template)]
#[template(path = "weather_card.html")]
struct WeatherCardTemplate {
    state: LookupState,
}

pub fn render_card(state: LookupState) -> Result<String, InternalError> {
    Ok(WeatherCardTemplate { state }.render()?)
}

#[derive(Deserialize, Debug)]
struct WeatherParams {
    #[serde(default)]
    city: String,
    /// Token of the page that sent the request, see `LookupTracker`.
    page: Option<String>,
}

async fn get_weather(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Response, InternalError> {
    let ticket = match params.page.as_deref() {
        Some(page) if !page.is_empty() => state.tracker.begin(page).await,
        _ => None,
    };

    let lookup_state = LookupState::resolve(&state.lookup, &params.city).await;

    if let Some(ticket) = ticket {
        if !state.tracker.is_current(&ticket).await {
            debug!(
                "dropping stale lookup {} for '{}'",
                ticket.generation, params.city
            );
            // htmx leaves the target untouched on 204.
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }

    let content = render_card(lookup_state)?;
    let content = if headers.get("hx-request").is_some() {
        content
    } else {
        render_main(&state.tracker, &params.city, &content).await?
    };
    // Browsers must not reuse a fragment as the page or the other way round.
    Ok(([(VARY, "HX-Request")], Html(content)).into_response())
}

#[derive(Serialize, Debug)]
struct ApiError {
    error: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'static str>,
}

impl ApiError {
    fn from_lookup(err: &LookupError) -> ApiError {
        ApiError {
            error: err.kind(),
            message: err.user_message(),
            cause: err.failure().map(|failure| failure.kind()),
        }
    }
}

async fn get_weather_json(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Response {
    match LookupState::resolve(&state.lookup, &params.city).await {
        LookupState::Ready(view) => Json(view).into_response(),
        LookupState::Idle => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "empty_query",
                message: "Please enter a city name.",
                cause: None,
            }),
        )
            .into_response(),
        LookupState::Failed(err) => {
            let status = match err {
                LookupError::CityNotFound { .. } => StatusCode::NOT_FOUND,
                LookupError::GeocodingFailed(_) | LookupError::WeatherFetchFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
            };
            (status, Json(ApiError::from_lookup(&err))).into_response()
        }
    }
}
