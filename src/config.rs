//! Process configuration read from the environment (and `.env`, if present).

use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub session_secure: bool,
    pub session_idle: time::Duration,
    pub cors_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
    /// Insert the starter classes and courses at start-up.
    pub seed_catalogue: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://luct.db?mode=rwc".to_owned(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_max_connections: 16,
            request_timeout: Duration::from_secs(10),
            session_secure: false,
            session_idle: time::Duration::minutes(60),
            cors_origins: Vec::new(),
            admin: None,
            seed_catalogue: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|var| dotenv::var(var).ok())
    }

    /// Builds a config from an arbitrary variable source, falling back to the
    /// defaults for anything unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let bind_addr = parse_or("BIND_ADDR", &lookup, defaults.bind_addr)?;
        let db_max_connections =
            parse_or("DB_MAX_CONNECTIONS", &lookup, defaults.db_max_connections)?;
        let request_timeout = Duration::from_secs(parse_or(
            "REQUEST_TIMEOUT_SECS",
            &lookup,
            defaults.request_timeout.as_secs(),
        )?);
        let session_secure = parse_or("SESSION_SECURE", &lookup, defaults.session_secure)?;
        let seed_catalogue = parse_or("SEED_CATALOGUE", &lookup, defaults.seed_catalogue)?;
        let session_idle = time::Duration::minutes(parse_or(
            "SESSION_IDLE_MINUTES",
            &lookup,
            defaults.session_idle.whole_minutes(),
        )?);

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        if request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "REQUEST_TIMEOUT_SECS",
                reason: "must be at least one second".to_owned(),
            });
        }

        Ok(Config {
            database_url,
            bind_addr,
            db_max_connections,
            request_timeout,
            session_secure,
            session_idle,
            cors_origins,
            admin,
            seed_catalogue,
        })
    }
}

fn parse_or<T>(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            var,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}
