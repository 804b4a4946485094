// Start of file: /src/config/environment.rs

// * Environment configuration, loaded once at startup and shared
// * through AppState.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{bail, Context, Result};
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_STORAGE_BACKEND: &str = "postgres";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "juno";
const DEFAULT_JWT_SECRET: &str = "juno-development-secret";
const DEFAULT_GOOGLE_REDIRECT_URL: &str = "http://localhost:3000/auth/google/callback";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 30; // 30 seconds
const DEFAULT_DB_PORT: u16 = 5432; // Default Postgres port
pub const DEFAULT_JWT_TTL_HOURS: i64 = 24;
const MAX_JWT_TTL_HOURS: i64 = 8760; // one year

/// Where users, friendships and rides are persisted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("Invalid STORAGE_BACKEND '{other}', expected 'postgres' or 'memory'"),
        }
    }
}

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
    pub db_name: Cow<'static, str>,
    pub jwt_secret: Cow<'static, str>,
    pub jwt_ttl_hours: i64,
    pub google_client_id: Cow<'static, str>,
    pub google_client_secret: Cow<'static, str>,
    pub google_redirect_url: Cow<'static, str>,
    pub frontend_url: Option<String>,
    // * Empty means "mirror the request origin"
    pub cors_allowed_origins: Vec<String>,
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars()
            .chain(dotenv::vars())
            .collect();

        Self::from_map(&vars)
    }

    // * Builds the configuration from an explicit key/value map
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        // * A small helper closure to fetch a non-empty variable by key
        let get_var = |key: &str| {
            vars.get(key)
                .map(String::as_str)
                .filter(|s: &&str| !s.trim().is_empty())
        };

        let environment: Cow<'static, str> = get_var("ENVIRONMENT")
            .map(|s| Cow::Owned(s.into()))
            .unwrap_or_else(|| {
                warn!("Missing ENVIRONMENT, defaulting to '{DEFAULT_ENVIRONMENT}'");
                Cow::Borrowed(DEFAULT_ENVIRONMENT)
            });
        let is_production: bool = environment == "production";

        let jwt_secret: Cow<'static, str> = match get_var("JWT_SECRET") {
            Some(s) => Cow::Owned(s.into()),
            None if is_production => bail!("JWT_SECRET must be set in production"),
            None => {
                warn!("Missing JWT_SECRET, using the development secret");
                Cow::Borrowed(DEFAULT_JWT_SECRET)
            }
        };

        let jwt_ttl_hours: i64 = get_var("JWT_TTL_HOURS")
            .map(|s| s.parse().context("Invalid JWT_TTL_HOURS"))
            .transpose()?
            .unwrap_or(DEFAULT_JWT_TTL_HOURS);
        if !(1..=MAX_JWT_TTL_HOURS).contains(&jwt_ttl_hours) {
            bail!("JWT_TTL_HOURS must be between 1 and {MAX_JWT_TTL_HOURS}, got {jwt_ttl_hours}");
        }

        // * Build our EnvironmentVariables, providing defaults if missing
        Ok(Self {
            environment,

            host: get_var("HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_HOST)),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            protocol: get_var("PROTOCOL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_PROTOCOL)),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            storage_backend: StorageBackend::parse(
                get_var("STORAGE_BACKEND").unwrap_or(DEFAULT_STORAGE_BACKEND),
            )?,

            db_host: get_var("DB_HOST")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_HOST, defaulting to '{DEFAULT_DB_HOST}'");
                    Cow::Borrowed(DEFAULT_DB_HOST)
                }),

            db_port: get_var("DB_PORT")
                .map(|s| s.parse().context("Invalid DB_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_PORT),

            db_user: get_var("DB_USER")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_USER, defaulting to '{DEFAULT_DB_USER}'");
                    Cow::Borrowed(DEFAULT_DB_USER)
                }),

            db_password: get_var("DB_PASSWORD")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing DB_PASSWORD, defaulting to '{DEFAULT_DB_PASSWORD}'");
                    Cow::Borrowed(DEFAULT_DB_PASSWORD)
                }),

            db_name: get_var("DB_NAME")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_DB_NAME)),

            jwt_secret,

            jwt_ttl_hours,

            google_client_id: get_var("GOOGLE_CLIENT_ID")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or_else(|| {
                    warn!("Missing GOOGLE_CLIENT_ID, Google login will fail");
                    Cow::Borrowed("")
                }),

            google_client_secret: get_var("GOOGLE_CLIENT_SECRET")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed("")),

            google_redirect_url: get_var("GOOGLE_REDIRECT_URL")
                .map(|s| Cow::Owned(s.into()))
                .unwrap_or(Cow::Borrowed(DEFAULT_GOOGLE_REDIRECT_URL)),

            frontend_url: get_var("FRONTEND_URL")
                .map(|s| s.trim_end_matches('/').to_string()),

            cors_allowed_origins: get_var("CORS_ALLOWED_ORIGINS")
                .map(parse_origin_list)
                .unwrap_or_default(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// * "*" collapses to an empty list, which mirrors the caller's origin
fn parse_origin_list(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s: &&str| !s.is_empty())
        .map(|s: &str| s.trim_end_matches('/').to_string())
        .collect();

    if origins.iter().any(|o: &String| o == "*") {
        Vec::new()
    } else {
        origins
    }
}


// End of file: /src/config/environment.rs
