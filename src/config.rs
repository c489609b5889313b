use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// `None` disables upstream lookups; every request reports unavailable.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite URL. The in-memory store is used when unset.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub weather: WeatherConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "skytodo".to_string()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "skytodo-users".to_string()),
            ttl_minutes: parse_ttl_minutes(get("JWT_TTL_MINUTES"))?,
        };

        let weather = WeatherConfig {
            api_key: get("OPENWEATHER_API_KEY"),
            base_url: get("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| "https://api.openweathermap.org/data/2.5".to_string()),
            timeout: Duration::from_secs(parse_or(
                "WEATHER_TIMEOUT_SECS",
                get("WEATHER_TIMEOUT_SECS"),
                5,
            )?),
        };

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("APP_PORT", get("APP_PORT"), 3000)?,
            database_url: get("DATABASE_URL"),
            jwt,
            weather,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "APP_HOST",
            value: self.host.clone(),
        })
    }
}

fn parse_ttl_minutes(raw: Option<String>) -> Result<i64, ConfigError> {
    let minutes = parse_or("JWT_TTL_MINUTES", raw, 60)?;
    if !(1..=MAX_JWT_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::Invalid {
            key: "JWT_TTL_MINUTES",
            value: minutes.to_string(),
        });
    }
    Ok(minutes)
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, None);
        assert_eq!(config.jwt.issuer, "skytodo");
        assert_eq!(config.jwt.ttl_minutes, 60);
        assert_eq!(config.weather.api_key, None);
        assert_eq!(config.weather.timeout, Duration::from_secs(5));
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn unparsable_port_is_an_error() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("APP_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "APP_PORT", .. }));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", ""),
            ("OPENWEATHER_API_KEY", "  "),
        ]))
        .unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.weather.api_key, None);
    }

    #[test]
    fn token_lifetime_must_be_between_one_minute_and_one_year() {
        for raw in ["0", "-5", "525601", "9000000000000000000"] {
            let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("JWT_TTL_MINUTES", raw)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: "JWT_TTL_MINUTES", .. }),
                "{raw} was accepted"
            );
        }

        let config =
            Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("JWT_TTL_MINUTES", "525600")]))
                .unwrap();
        assert_eq!(config.jwt.ttl_minutes, MAX_JWT_TTL_MINUTES);
    }
}
