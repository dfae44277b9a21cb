//! Translation of Open-Meteo (WMO) weather codes into display labels.
//!
//! The table only covers the common codes. Anything else resolves to
//! [`UNKNOWN`] instead of failing.

/// A label and the icon shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherDescription {
    pub label: &'static str,
    pub icon: &'static str,
}

pub const UNKNOWN: WeatherDescription = WeatherDescription {
    label: "Unknown weather",
    icon: "🌈",
};

const TABLE: [(i32, WeatherDescription); 11] = [
    (0, describe("Clear sky", "☀️")),
    (1, describe("Mainly clear", "🌤️")),
    (2, describe("Partly cloudy", "⛅")),
    (3, describe("Overcast", "☁️")),
    (45, describe("Fog", "🌫️")),
    (48, describe("Rime fog", "🌫️")),
    (51, describe("Light drizzle", "🌦️")),
    (61, describe("Rain", "🌧️")),
    (71, describe("Snow", "❄️")),
    (80, describe("Rain showers", "🌧️")),
    (95, describe("Thunderstorm", "⛈️")),
];

const fn describe(label: &'static str, icon: &'static str) -> WeatherDescription {
    WeatherDescription { label, icon }
}

/// Look up `code`, falling back to [`UNKNOWN`].
pub fn describe_weather_code(code: i32) -> WeatherDescription {
    TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
        .unwrap_or(UNKNOWN)
}

/// Whether `code` has its own entry in the table.
pub fn is_known_weather_code(code: i32) -> bool {
    TABLE.iter().any(|(known, _)| *known == code)
}
