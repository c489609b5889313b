use serde::{Deserialize, Serialize};

/// Current condition, as named by the upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Other(String),
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Clear" => Condition::Clear,
            "Clouds" => Condition::Clouds,
            "Rain" => Condition::Rain,
            "Drizzle" => Condition::Drizzle,
            "Thunderstorm" => Condition::Thunderstorm,
            "Snow" => Condition::Snow,
            _ => Condition::Other(raw),
        }
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Clear => "Clear".to_string(),
            Condition::Clouds => "Clouds".to_string(),
            Condition::Rain => "Rain".to_string(),
            Condition::Drizzle => "Drizzle".to_string(),
            Condition::Thunderstorm => "Thunderstorm".to_string(),
            Condition::Snow => "Snow".to_string(),
            Condition::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub condition: Condition,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl Location {
    /// Used when a lookup names neither a city nor coordinates (central London).
    pub const DEFAULT: Location = Location::Coordinates {
        lat: 51.5074,
        lon: -0.1278,
    };
}
