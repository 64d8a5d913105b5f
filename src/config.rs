use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub images: ImageConfig,
    pub profile: ProfileConfig,
    pub cache: CacheConfig,
    pub alerts: Option<AlertsConfig>,
    pub sweep: SweepConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Directory uploaded images are stored in
    pub storage_path: String,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// How many username changes an account gets
    pub name_change_limit: u32,
}

#[derive(Debug, Clone)]
pub enum CacheBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis connection URL (required when backend is redis)
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AlertsConfig {
    /// Alert service endpoint for typed alerts
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Seconds between subscription expiry passes
    pub subscription_interval_secs: u64,
    /// Seconds between orphaned image purge passes
    pub image_interval_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            storage_path: "./uploads".to_string(),
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            subscription_interval_secs: 300,
            image_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let storage_path =
            std::env::var("IMAGE_STORAGE_PATH").unwrap_or_else(|_| "./uploads".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        let name_change_limit = std::env::var("NAME_CHANGE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let cache_backend = match std::env::var("CACHE_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => CacheBackend::Memory,
            _ => CacheBackend::Redis,
        };

        let redis_url = std::env::var("REDIS_URL").ok();

        let alerts = std::env::var("ALERTS_URL").ok().map(|url| AlertsConfig {
            url,
            token: std::env::var("ALERTS_TOKEN").ok(),
        });

        let subscription_interval_secs = std::env::var("SUBSCRIPTION_SWEEP_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let image_interval_secs = std::env::var("IMAGE_SWEEP_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            images: ImageConfig {
                storage_path,
                max_upload_size,
            },
            profile: ProfileConfig { name_change_limit },
            cache: CacheConfig {
                backend: cache_backend,
                redis_url,
            },
            alerts,
            sweep: SweepConfig {
                subscription_interval_secs,
                image_interval_secs,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.cache.backend, CacheBackend::Redis) && self.cache.redis_url.is_none() {
            return Err(ConfigError::ValidationError(
                "REDIS_URL is required when CACHE_BACKEND=redis".to_string(),
            ));
        }

        if self.images.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.sweep.subscription_interval_secs == 0 || self.sweep.image_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sweep intervals must be greater than 0".to_string(),
            ));
        }

        if let Some(alerts) = &self.alerts {
            if alerts.token.is_none() {
                tracing::warn!(url = %alerts.url, "ALERTS_URL set without ALERTS_TOKEN");
            }
        }

        Ok(())
    }
}
