use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::models::open_meteo::{FetchFailure, GeoResult, OpenMeteoClient};
use crate::models::weather_code::{describe_weather_code, is_known_weather_code};

/// Trimmed, non-empty city text as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    /// `None` for empty or whitespace-only input, which is the idle state
    /// rather than an error.
    pub fn parse(raw: &str) -> Option<CityQuery> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(CityQuery(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
    /// When we received the data, not when the provider measured it.
    pub observed_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub city: String,
    pub country: String,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub weather_code: i32,
    pub description: &'static str,
    pub icon: &'static str,
    pub observed_at: DateTime<Local>,
}

impl WeatherView {
    pub fn new(city: GeoResult, weather: CurrentWeather) -> WeatherView {
        let description = describe_weather_code(weather.weather_code);
        WeatherView {
            city: city.name,
            country: city.country,
            temperature_c: weather.temperature_c,
            wind_speed_kmh: weather.wind_speed_kmh,
            weather_code: weather.weather_code,
            description: description.label,
            icon: description.icon,
            observed_at: weather.observed_at,
        }
    }

    pub fn location_label(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }

    pub fn temperature_label(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }

    pub fn wind_label(&self) -> String {
        format!("{:.1} km/h", self.wind_speed_kmh)
    }

    pub fn observed_label(&self) -> String {
        self.observed_at.format("%I:%M %p").to_string()
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no city matches '{query}'")]
    CityNotFound { query: String },
    #[error("geocoding failed: {0}")]
    GeocodingFailed(#[source] FetchFailure),
    #[error("weather fetch failed: {0}")]
    WeatherFetchFailed(#[source] FetchFailure),
}

impl LookupError {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::CityNotFound { .. } => "city_not_found",
            LookupError::GeocodingFailed(_) => "geocoding_failed",
            LookupError::WeatherFetchFailed(_) => "weather_fetch_failed",
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            LookupError::CityNotFound { .. } => None,
            LookupError::GeocodingFailed(failure) | LookupError::WeatherFetchFailed(failure) => {
                Some(failure)
            }
        }
    }

    /// Short text shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::CityNotFound { .. } => "City not found. Please check spelling.",
            LookupError::GeocodingFailed(_) => "Unable to search for cities right now.",
            LookupError::WeatherFetchFailed(_) => "Unable to fetch weather data.",
        }
    }

    /// Second line telling a network problem apart from a provider error.
    pub fn detail(&self) -> Option<String> {
        Some(match self.failure()? {
            FetchFailure::Transport(_) => {
                "The weather service could not be reached. Please try again later.".to_string()
            }
            FetchFailure::Status(status) => format!(
                "The weather service returned an error ({}). Data is temporarily unavailable.",
                status.as_u16()
            ),
            FetchFailure::Decode(_) => {
                "The weather service sent a response we could not read.".to_string()
            }
        })
    }
}

/// Resolves a city to its current weather with two sequential provider
/// calls. Keeps no state between lookups.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    client: OpenMeteoClient,
}

impl WeatherLookup {
    pub fn new(client: OpenMeteoClient) -> Self {
        WeatherLookup { client }
    }

    pub async fn lookup(&self, query: &CityQuery) -> Result<WeatherView, LookupError> {
        let city = self
            .client
            .search_city(query.as_str())
            .await
            .map_err(LookupError::GeocodingFailed)?
            .ok_or_else(|| LookupError::CityNotFound {
                query: query.as_str().to_string(),
            })?;
        debug!(
            "resolved '{}' to {} ({}, {})",
            query.as_str(),
            city.name,
            city.latitude,
            city.longitude
        );

        let conditions = self
            .client
            .current_weather(city.latitude, city.longitude)
            .await
            .map_err(LookupError::WeatherFetchFailed)?;
        if !is_known_weather_code(conditions.weathercode) {
            debug!("no label for weather code {}", conditions.weathercode);
        }

        let weather = CurrentWeather {
            temperature_c: conditions.temperature,
            wind_speed_kmh: conditions.windspeed,
            weather_code: conditions.weathercode,
            observed_at: Local::now(),
        };
        let view = WeatherView::new(city, weather);
        info!(
            "{}: {}, {}",
            view.location_label(),
            view.temperature_label(),
            view.description
        );
        Ok(view)
    }
}

/// The three things the result area can show.
#[derive(Debug)]
pub enum LookupState {
    Idle,
    Failed(LookupError),
    Ready(WeatherView),
}

impl LookupState {
    pub async fn resolve(lookup: &WeatherLookup, raw: &str) -> LookupState {
        match CityQuery::parse(raw) {
            None => LookupState::Idle,
            Some(query) => match lookup.lookup(&query).await {
                Ok(view) => LookupState::Ready(view),
                Err(err) => {
                    debug!("lookup for '{}' failed: {err}", query.as_str());
                    LookupState::Failed(err)
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::open_meteo::test::{
        FORECAST_PATH, GEOCODING_PATH, lahore_geocoding, mainly_clear_forecast, settings_for,
    };
    use crate::config::ProviderSettings;
    use crate::models::weather_code::UNKNOWN;
    use reqwest::StatusCode;
    use wiremock::matchers::{any, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_for(server: &MockServer) -> WeatherLookup {
        WeatherLookup::new(OpenMeteoClient::new(&settings_for(server)).unwrap())
    }

    async fn mount_geocoding(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(GEOCODING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn forecast_with_code(code: i32) -> serde_json::Value {
        serde_json::json!({
            "current_weather": {"temperature": 12.0, "windspeed": 3.0, "weathercode": code}
        })
    }

    #[test]
    fn blank_input_is_not_a_query() {
        for raw in ["", " ", "\t\n", "   "] {
            assert_eq!(CityQuery::parse(raw), None);
        }
        assert_eq!(
            CityQuery::parse("  Karachi ").map(|q| q.as_str().to_string()),
            Some("Karachi".to_string())
        );
    }

    #[tokio::test]
    async fn blank_input_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let state = LookupState::resolve(&lookup_for(&server), "   ").await;
        assert!(matches!(state, LookupState::Idle));
    }

    #[tokio::test]
    async fn lahore_mainly_clear() {
        let server = MockServer::start().await;
        mount_geocoding(&server, lahore_geocoding()).await;
        Mock::given(method("GET"))
            .and(path(FORECAST_PATH))
            .and(query_param("latitude", "31.5"))
            .and(query_param("longitude", "74.3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mainly_clear_forecast()))
            .expect(1)
            .mount(&server)
            .await;

        let before = Local::now();
        let view = lookup_for(&server)
            .lookup(&CityQuery::parse("Lahore").unwrap())
            .await
            .unwrap();

        assert_eq!(view.location_label(), "Lahore, Pakistan");
        assert_eq!(view.temperature_label(), "28.5°C");
        assert_eq!(view.wind_label(), "10.2 km/h");
        assert_eq!(view.description, "Mainly clear");
        assert!(view.observed_at >= before);
    }

    #[tokio::test]
    async fn no_matches_skips_weather_call() {
        let server = MockServer::start().await;
        mount_geocoding(&server, serde_json::json!({"generationtime_ms": 0.1})).await;
        Mock::given(path(FORECAST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mainly_clear_forecast()))
            .expect(0)
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .lookup(&CityQuery::parse("Xyzzyville").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::CityNotFound { ref query } if query == "Xyzzyville"));
        assert_eq!(err.user_message(), "City not found. Please check spelling.");
        assert_eq!(err.detail(), None);
    }

    #[tokio::test]
    async fn weather_error_status() {
        let server = MockServer::start().await;
        mount_geocoding(&server, lahore_geocoding()).await;
        Mock::given(path(FORECAST_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .lookup(&CityQuery::parse("Lahore").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::WeatherFetchFailed(FetchFailure::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
        assert_eq!(err.kind(), "weather_fetch_failed");
        assert!(err.detail().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn weather_provider_unreachable() {
        let server = MockServer::start().await;
        mount_geocoding(&server, lahore_geocoding()).await;
        // Grab a free port and close it again so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let settings = ProviderSettings {
            forecast_url: format!("http://127.0.0.1:{port}{FORECAST_PATH}"),
            ..settings_for(&server)
        };
        let lookup = WeatherLookup::new(OpenMeteoClient::new(&settings).unwrap());

        let err = lookup
            .lookup(&CityQuery::parse("Lahore").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::WeatherFetchFailed(FetchFailure::Transport(_))
        ));
        assert_eq!(err.kind(), "weather_fetch_failed");
        assert_eq!(err.user_message(), "Unable to fetch weather data.");
        assert!(err.detail().unwrap().contains("could not be reached"));
    }

    #[tokio::test]
    async fn geocoding_error_status() {
        let server = MockServer::start().await;
        Mock::given(path(GEOCODING_PATH))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path(FORECAST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(mainly_clear_forecast()))
            .expect(0)
            .mount(&server)
            .await;

        let err = lookup_for(&server)
            .lookup(&CityQuery::parse("Lahore").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::GeocodingFailed(FetchFailure::Status(_))));
    }

    #[tokio::test]
    async fn every_known_code_and_a_fallback() {
        let server = MockServer::start().await;
        mount_geocoding(&server, lahore_geocoding()).await;
        let cases = [
            (0, "Clear sky"),
            (3, "Overcast"),
            (48, "Rime fog"),
            (95, "Thunderstorm"),
            (77, UNKNOWN.label),
        ];
        for (code, label) in cases {
            let mock = Mock::given(path(FORECAST_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(forecast_with_code(code)))
                .mount_as_scoped(&server)
                .await;
            let view = lookup_for(&server)
                .lookup(&CityQuery::parse("Lahore").unwrap())
                .await
                .unwrap();
            assert_eq!(view.description, label);
            drop(mock);
        }
    }

    #[test]
    fn location_without_country() {
        let view = WeatherView::new(
            GeoResult {
                name: "Null Island".to_string(),
                country: String::new(),
                latitude: 0.0,
                longitude: 0.0,
            },
            CurrentWeather {
                temperature_c: 28.0,
                wind_speed_kmh: 0.0,
                weather_code: 0,
                observed_at: Local::now(),
            },
        );
        assert_eq!(view.location_label(), "Null Island");
        assert_eq!(view.temperature_label(), "28.0°C");
    }
}
