pub mod lookup;
pub mod open_meteo;
pub mod sequence;
pub mod theme;
pub mod weather_code;
