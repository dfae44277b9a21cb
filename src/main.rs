use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;

use app::{AppState, create_app};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use config::{Settings, tls_files};

mod app;
mod config;
mod error;
mod models;
mod routes;

#[derive(Parser, Debug)]
#[command(author, version, about = "Current weather for any city", long_about = None)]
struct Args {
    /// TOML settings file. Defaults to weather.toml when it exists.
    #[arg(long, env = "WEATHER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, env = "LISTEN_ADDRESS")]
    listen: Option<SocketAddr>,

    #[arg(long, env = "GEOCODING_URL")]
    geocoding_url: Option<String>,

    #[arg(long, env = "FORECAST_URL")]
    forecast_url: Option<String>,

    #[arg(short, long, env = "KEY_FILE_PATH")]
    key_file_path: Option<String>,

    #[arg(short, long, env = "CERT_FILE_PATH")]
    cert_file_path: Option<String>,
}

impl Args {
    fn settings(&self) -> Result<Settings, config::ConfigError> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(listen) = self.listen {
            settings.listen_address = listen;
        }
        if let Some(geocoding_url) = &self.geocoding_url {
            settings.providers.geocoding_url = geocoding_url.clone();
        }
        if let Some(forecast_url) = &self.forecast_url {
            settings.providers.forecast_url = forecast_url.clone();
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();
    let settings = args.settings()?;
    let tls = tls_files(args.key_file_path, args.cert_file_path)?;

    log::info!(
        "geocoding via {}, forecasts via {}",
        settings.providers.geocoding_url,
        settings.providers.forecast_url
    );
    let state = AppState::new(&settings)?;
    let app = create_app(state, &settings.assets_path);

    let addr = settings.listen_address;
    log::info!("listening on {}", addr);
    if let Some(tls) = tls {
        log::info!(
            "using tls with key file {} and cert file {}",
            tls.key_file_path,
            tls.cert_file_path
        );
        let tls = RustlsConfig::from_pem_file(tls.cert_file_path, tls.key_file_path).await?;
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
    } else {
        axum_server::bind(addr)
            .serve(app.into_make_service())
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_line_overrides_defaults() {
        let args = Args::parse_from([
            "weather-dashboard",
            "--listen",
            "127.0.0.1:4000",
            "--forecast-url",
            "http://localhost:1234/v1/forecast",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.listen_address, SocketAddr::from(([127, 0, 0, 1], 4000)));
        assert_eq!(
            settings.providers.forecast_url,
            "http://localhost:1234/v1/forecast"
        );
        assert_eq!(
            settings.providers.geocoding_url,
            config::DEFAULT_GEOCODING_URL
        );
    }

    #[test]
    fn args_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
