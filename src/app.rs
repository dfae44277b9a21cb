use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::models::lookup::WeatherLookup;
use crate::models::open_meteo::OpenMeteoClient;
use crate::models::sequence::LookupTracker;
use crate::routes::{index, weather};

// Anything that goes in here must be a handle or pointer that can be cloned.
// The underlying state itself should be shared.
#[derive(Clone)]
pub struct AppState {
    pub lookup: WeatherLookup,
    pub tracker: LookupTracker,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<AppState, reqwest::Error> {
        let client = OpenMeteoClient::new(&settings.providers)?;
        Ok(AppState {
            lookup: WeatherLookup::new(client),
            tracker: LookupTracker::new(),
        })
    }
}

pub fn create_app(state: AppState, assets_path: &str) -> Router {
    let app = Router::new()
        .merge(index::routes(state.clone()))
        .nest("/weather", weather::routes(state.clone()))
        .nest("/api/weather", weather::api_routes(state))
        .layer(TraceLayer::new_for_http());

    log::debug!("serving assets from {}", assets_path);
    let assets_service = ServeDir::new(assets_path);
    app.fallback_service(assets_service)
}
