//! HTTP client for the two Open-Meteo endpoints: geocoding search and
//! current conditions. Neither needs an API key.

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ProviderSettings;

/// Why a provider call did not produce a usable body.
#[derive(Error, Debug)]
pub enum FetchFailure {
    /// The request never got a response: connection refused, DNS, timeout.
    #[error("provider could not be reached: {0}")]
    Transport(#[source] reqwest::Error),
    /// The provider answered, but not with a success status.
    #[error("provider responded with status {0}")]
    Status(StatusCode),
    #[error("provider response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Transport(_) => "transport",
            FetchFailure::Status(_) => "status",
            FetchFailure::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoResult {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Debug)]
struct GeocodingResponse {
    // Open-Meteo leaves the key out entirely when nothing matches.
    #[serde(default)]
    results: Vec<GeocodingEntry>,
}

#[derive(Deserialize, Debug)]
struct GeocodingEntry {
    name: String,
    #[serde(default)]
    country: String,
    latitude: f64,
    longitude: f64,
}

impl From<GeocodingEntry> for GeoResult {
    fn from(entry: GeocodingEntry) -> Self {
        GeoResult {
            name: entry.name,
            country: entry.country,
            latitude: entry.latitude,
            longitude: entry.longitude,
        }
    }
}

/// What the forecast endpoint reports under `current_weather`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
}

#[derive(Deserialize, Debug)]
struct ForecastResponse {
    current_weather: CurrentConditions,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(settings.user_agent.clone());
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(OpenMeteoClient {
            http: builder.build()?,
            geocoding_url: settings.geocoding_url.clone(),
            forecast_url: settings.forecast_url.clone(),
        })
    }

    /// First match for `name`, in provider order. `None` when there are
    /// no matches at all.
    pub async fn search_city(&self, name: &str) -> Result<Option<GeoResult>, FetchFailure> {
        debug!("geocoding '{name}'");
        let response: GeocodingResponse = self
            .get_json(&self.geocoding_url, &[("name", name.to_string())])
            .await?;
        Ok(response.results.into_iter().next().map(GeoResult::from))
    }

    pub async fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, FetchFailure> {
        debug!("fetching current weather at ({latitude}, {longitude})");
        let response: ForecastResponse = self
            .get_json(
                &self.forecast_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current_weather", "true".to_string()),
                ],
            )
            .await?;
        Ok(response.current_weather)
    }

    // The query pairs are percent-encoded by reqwest, so arbitrary user
    // text is safe to pass through.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchFailure> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                warn!("request to {url} failed: {err}");
                FetchFailure::Transport(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{url} responded with status {status}");
            return Err(FetchFailure::Status(status));
        }

        let body = response.text().await.map_err(FetchFailure::Transport)?;
        serde_json::from_str(&body).map_err(|err| {
            warn!("could not decode response from {url}: {err}");
            FetchFailure::Decode(err)
        })
    }
}
