use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Records returned per page when nothing overrides `API_PAGE_SIZE`.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub project_name: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Overrides the database named in the path of `DATABASE_URL`.
    pub name: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub page_size: u32,
    /// Serve `GET /<table>/all`, the unpaginated dump.
    pub enable_dump_route: bool,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    /// Restrict exposure to these tables. `None` exposes every base table.
    pub tables: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::defaults(environment).with_env_overrides()
    }

    /// Profile defaults without any environment overrides.
    pub fn defaults(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PROJECT_NAME") {
            self.server.project_name = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_override("PORT", &v, self.server.port);
        }
        if let Ok(v) = env::var("SERVER_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_override("SERVER_TIMEOUT_SECS", &v, self.server.request_timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_override("DATABASE_MAX_CONNECTIONS", &v, self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = parse_override("DATABASE_CONNECTION_TIMEOUT", &v, self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = parse_override("DATABASE_ENABLE_QUERY_LOGGING", &v, self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = parse_override("DATABASE_SLOW_QUERY_THRESHOLD_MS", &v, self.database.slow_query_threshold_ms);
        }

        // API overrides
        if let Ok(v) = env::var("API_PAGE_SIZE") {
            match parse_override("API_PAGE_SIZE", &v, self.api.page_size) {
                0 => tracing::warn!(value = %v, "API_PAGE_SIZE must be positive; keeping {}", self.api.page_size),
                n => self.api.page_size = n,
            }
        }
        if let Ok(v) = env::var("API_ENABLE_DUMP_ROUTE") {
            self.api.enable_dump_route = parse_override("API_ENABLE_DUMP_ROUTE", &v, self.api.enable_dump_route);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = parse_override("API_ENABLE_REQUEST_LOGGING", &v, self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse_override("API_MAX_REQUEST_SIZE_BYTES", &v, self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_TABLES") {
            let tables: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            self.api.tables = if tables.is_empty() { None } else { Some(tables) };
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = parse_override("SECURITY_ENABLE_CORS", &v, self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = parse_override("SECURITY_BCRYPT_COST", &v, self.security.bcrypt_cost);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                project_name: "Narnia".to_string(),
                port: 3077,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                name: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                page_size: DEFAULT_PAGE_SIZE,
                enable_dump_route: true,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                tables: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                project_name: "Narnia".to_string(),
                port: 3077,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                name: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                page_size: DEFAULT_PAGE_SIZE,
                enable_dump_route: false,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                tables: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                bcrypt_cost: 12,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                project_name: "Narnia".to_string(),
                port: 3077,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                name: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                page_size: DEFAULT_PAGE_SIZE,
                enable_dump_route: false,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                tables: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                bcrypt_cost: 12,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

/// Parse an override, keeping `current` (with a warning) when the value is malformed.
fn parse_override<T>(key: &str, value: &str, current: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(key, value, "ignoring invalid override: {}", e);
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.api.enable_dump_route);
        assert_eq!(config.server.port, 3077);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.enable_dump_route);
        assert_eq!(config.api.page_size, 25);
        assert!(config.security.bcrypt_cost >= 10);
    }

    #[test]
    fn malformed_overrides_keep_the_current_value() {
        assert_eq!(parse_override("PORT", "80a", 3077u16), 3077);
        assert_eq!(parse_override("PORT", " 8080 ", 3077u16), 8080);
        assert!(!parse_override("API_ENABLE_DUMP_ROUTE", "false", true));
    }
}
