/// Configuration management for Thread Service
///
/// All settings are read from environment variables with development defaults.
use cache_invalidation::InvalidationPublisher;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Revalidation (Redis pub/sub) configuration
    pub revalidation: RevalidationConfig,
    /// Feed pagination limits
    pub feed: FeedConfig,
    /// Background link repair
    pub link_repair: LinkRepairConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Revalidation notifications are disabled when `redis_url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidationConfig {
    pub redis_url: Option<String>,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRepairConfig {
    /// Seconds between sweeps; 0 disables the job
    pub interval_secs: u64,
    /// Max records relinked per collection per sweep
    pub batch_size: i64,
}

impl LinkRepairConfig {
    pub fn enabled(&self) -> bool {
        self.interval_secs > 0
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("THREAD_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("THREAD_SERVICE_PORT", 8085)?,
        };
        let production = app.is_production();

        let feed = FeedConfig {
            default_page_size: parse_env_or_default("FEED_DEFAULT_PAGE_SIZE", 20)?,
            max_page_size: parse_env_or_default("FEED_MAX_PAGE_SIZE", 100)?,
        };
        if feed.default_page_size == 0 || feed.max_page_size == 0 {
            return Err("FEED_DEFAULT_PAGE_SIZE and FEED_MAX_PAGE_SIZE must be positive".to_string());
        }
        if feed.default_page_size > feed.max_page_size {
            return Err(format!(
                "FEED_DEFAULT_PAGE_SIZE ({}) exceeds FEED_MAX_PAGE_SIZE ({})",
                feed.default_page_size, feed.max_page_size
            ));
        }

        let link_repair = LinkRepairConfig {
            interval_secs: parse_env_or_default("LINK_REPAIR_INTERVAL_SECS", 300)?,
            batch_size: parse_env_or_default("LINK_REPAIR_BATCH_SIZE", 500)?,
        };
        if link_repair.batch_size <= 0 {
            return Err("LINK_REPAIR_BATCH_SIZE must be positive".to_string());
        }

        Ok(Config {
            app,
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/threads".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            revalidation: RevalidationConfig {
                redis_url: std::env::var("REDIS_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                channel: std::env::var("REVALIDATION_CHANNEL")
                    .ok()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| InvalidationPublisher::DEFAULT_CHANNEL.to_string()),
            },
            feed,
            link_repair,
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
