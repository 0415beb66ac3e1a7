use crate::error::{AppError, Result};
use std::{env, str::FromStr};

const DEFAULT_CORS_ORIGINS: &str = "http://127.0.0.1:5500,http://localhost:5500";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` runs the service on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub public_base_url: Option<String>,
}

fn parse_or<T: FromStr>(value: Option<String>, default: T, key: &str) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::ConfigError(format!("Invalid {} value", key))),
        None => Ok(default),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_origins: Vec<String> = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if allowed_origins.iter().any(|origin| origin == "*") {
            return Err(AppError::ConfigError(
                "CORS_ALLOWED_ORIGINS must list explicit origins, not '*'".to_string(),
            ));
        }

        let jwt_secret = non_blank(lookup("JWT_SECRET"))
            .ok_or_else(|| AppError::ConfigError("JWT_SECRET not set".to_string()))?;

        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("PORT"), 3000, "PORT")?,
                max_body_size: parse_or(lookup("MAX_BODY_SIZE"), 1_048_576, "MAX_BODY_SIZE")?,
            },
            database: DatabaseConfig {
                url: non_blank(lookup("DB_URL")),
                max_connections: parse_or(
                    lookup("DB_MAX_CONNECTIONS"),
                    20,
                    "DB_MAX_CONNECTIONS",
                )?,
            },
            cors: CorsConfig { allowed_origins },
            auth: AuthConfig { jwt_secret },
            media: MediaConfig {
                public_base_url: non_blank(lookup("MEDIA_BASE_URL")),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
