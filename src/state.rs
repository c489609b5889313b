use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db::{MemoryStore, SqliteStore, TaskStore, UserStore};
use crate::error::AppError;
use crate::weather::{OpenWeatherClient, UnconfiguredWeatherClient, WeatherClient};

/// Built once per process and handed to the router; tests build their own.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub weather: Arc<dyn WeatherClient>,
    pub keys: JwtKeys,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn init(config: Config) -> Result<Self, AppError> {
        let weather: Arc<dyn WeatherClient> = match config.weather.api_key.clone() {
            Some(api_key) => Arc::new(OpenWeatherClient::new(&config.weather, api_key)?),
            None => {
                warn!("OPENWEATHER_API_KEY is not set; weather lookups will report unavailable");
                Arc::new(UnconfiguredWeatherClient)
            }
        };

        match config.database_url.clone() {
            Some(url) => {
                let store = SqliteStore::connect(&url).await?;
                Ok(Self::with_store(config, Arc::new(store), weather))
            }
            None => {
                info!("DATABASE_URL is not set; using the in-memory store");
                Ok(Self::with_store(config, Arc::new(MemoryStore::new()), weather))
            }
        }
    }

    pub fn with_store<S>(config: Config, store: Arc<S>, weather: Arc<dyn WeatherClient>) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        Self {
            users: store.clone(),
            tasks: store,
            weather,
            keys: JwtKeys::new(&config.jwt),
            config: Arc::new(config),
        }
    }
}
