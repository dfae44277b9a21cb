use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::InternalError;
use crate::models::lookup::LookupState;
use crate::models::sequence::LookupTracker;
use crate::models::theme::{Theme, pick_theme};
use crate::routes::weather::render_card;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    theme: Theme,
    page_token: String,
    city: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug, Default)]
pub struct CityParams {
    #[serde(default)]
    pub city: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_index))
        .with_state(state)
}

// Also serves the plain form submission when javascript is unavailable.
async fn get_index(
    State(state): State<AppState>,
    Query(params): Query<CityParams>,
) -> Result<Response, InternalError> {
    let lookup_state = LookupState::resolve(&state.lookup, &params.city).await;
    let content = render_card(lookup_state)?;
    Ok(Html(render_main(&state.tracker, &params.city, &content).await?).into_response())
}

/// Wraps a rendered result card in the full page. The theme is rolled here,
/// once per page, and the page gets its own lookup token.
pub async fn render_main(
    tracker: &LookupTracker,
    city: &str,
    content: &str,
) -> Result<String, InternalError> {
    let page_token = tracker.register().await;
    render_page(pick_theme(), page_token, city, content)
}

fn render_page(
    theme: Theme,
    page_token: String,
    city: &str,
    content: &str,
) -> Result<String, InternalError> {
    Ok(IndexTemplate {
        theme,
        page_token,
        city,
        content,
    }
    .render()?)
}
