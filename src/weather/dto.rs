use serde::Deserialize;

/// Subset of OpenWeather's `GET /weather` response that we read.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub weather: Vec<WeatherEntry>,
    pub main: MainBlock,
    pub wind: Wind,
}

#[derive(Debug, Deserialize)]
pub struct WeatherEntry {
    pub main: String,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    pub speed: f64,
}
