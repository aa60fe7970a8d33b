//! Configuration management
//!
//! Loads and validates configuration from environment variables (and a `.env`
//! file when present). The token signing secret is always supplied from
//! outside the binary.

use rand::RngCore;
use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::accounts::{MAX_COST, MIN_COST};

/// Minimum signing secret length in bytes (the HS256 key size)
pub const MIN_SECRET_LEN: usize = 32;

/// Longest token lifetime accepted from configuration (one year)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// HMAC secret for token signing
    pub signing_secret: String,

    /// Whether `signing_secret` was generated at startup
    pub signing_secret_generated: bool,

    /// Access token TTL in seconds (default: 900 = 15 minutes)
    pub access_token_ttl_seconds: i64,

    /// Refresh token TTL in seconds (default: 86400 = 24 hours)
    pub refresh_token_ttl_seconds: i64,

    /// bcrypt work factor for stored passwords
    pub bcrypt_cost: u32,

    /// Seconds between ledger sweeps (default: 60)
    pub ledger_sweep_interval_seconds: u64,

    /// CORS allowed origins, comma separated
    pub cors_allowed_origins: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("signing_secret", &"****")
            .field("signing_secret_generated", &self.signing_secret_generated)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field(
                "ledger_sweep_interval_seconds",
                &self.ledger_sweep_interval_seconds,
            )
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .map(|s| s.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let (signing_secret, signing_secret_generated) =
            match lookup("SIGNING_SECRET").filter(|s| !s.is_empty()) {
                Some(secret) if secret.len() >= MIN_SECRET_LEN => (secret, false),
                Some(_) => {
                    return Err(ConfigError::InvalidValue(format!(
                        "SIGNING_SECRET must be at least {} bytes",
                        MIN_SECRET_LEN
                    )))
                }
                None if environment.is_production() => {
                    return Err(ConfigError::MissingEnvVar("SIGNING_SECRET".to_string()))
                }
                None => (generate_secret(), true),
            };

        let access_token_ttl_seconds = parse_ttl(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 900)?;
        let refresh_token_ttl_seconds = parse_ttl(&lookup, "REFRESH_TOKEN_TTL_SECONDS", 86_400)?;
        if refresh_token_ttl_seconds < access_token_ttl_seconds {
            return Err(ConfigError::InvalidValue(
                "REFRESH_TOKEN_TTL_SECONDS must not be shorter than ACCESS_TOKEN_TTL_SECONDS"
                    .to_string(),
            ));
        }

        let bcrypt_cost = parse_positive(&lookup, "BCRYPT_COST", i64::from(bcrypt::DEFAULT_COST))?;
        let bcrypt_cost = u32::try_from(bcrypt_cost)
            .ok()
            .filter(|cost| (MIN_COST..=MAX_COST).contains(cost))
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "BCRYPT_COST must be between {} and {}",
                    MIN_COST,
                    MAX_COST
                ))
            })?;

        let ledger_sweep_interval_seconds =
            parse_positive(&lookup, "LEDGER_SWEEP_INTERVAL_SECONDS", 60)? as u64;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS").filter(|s| !s.is_empty());

        Ok(Config {
            environment,
            host,
            port,
            log_level,
            signing_secret,
            signing_secret_generated,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            bcrypt_cost,
            ledger_sweep_interval_seconds,
            cors_allowed_origins,
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}

fn parse_ttl<F>(lookup: &F, key: &str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ttl = parse_positive(lookup, key, default)?;
    if ttl > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be at most {} seconds, got {}",
            key, MAX_TOKEN_TTL_SECONDS, ttl
        )));
    }
    Ok(ttl)
}

/// 32 random bytes, hex encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            "dev".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Staging
        );
        assert_eq!(
            "PROD".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("invalid".parse::<Environment>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SIGNING_SECRET", SECRET)]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl_seconds, 900);
        assert_eq!(config.refresh_token_ttl_seconds, 86_400);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.ledger_sweep_interval_seconds, 60);
        assert_eq!(config.signing_secret, SECRET);
        assert!(!config.signing_secret_generated);
    }

    #[test]
    fn test_secret_generated_outside_production() {
        let first = load(&[]).unwrap();
        let second = load(&[]).unwrap();

        assert!(first.signing_secret_generated);
        assert_eq!(first.signing_secret.len(), 64);
        assert_ne!(first.signing_secret, second.signing_secret);
    }

    #[test]
    fn test_secret_required_in_production() {
        let result = load(&[("ENVIRONMENT", "production")]);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));

        let config = load(&[("ENVIRONMENT", "production"), ("SIGNING_SECRET", SECRET)]).unwrap();
        assert!(config.environment.is_production());
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = load(&[("SIGNING_SECRET", "too-short")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_invalid_ttls() {
        for value in ["0", "-5", "soon"] {
            let result = load(&[("SIGNING_SECRET", SECRET), ("ACCESS_TOKEN_TTL_SECONDS", value)]);
            assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
        }

        let result = load(&[
            ("SIGNING_SECRET", SECRET),
            ("ACCESS_TOKEN_TTL_SECONDS", "3600"),
            ("REFRESH_TOKEN_TTL_SECONDS", "60"),
        ]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let max = MAX_TOKEN_TTL_SECONDS.to_string();
        let config = load(&[
            ("SIGNING_SECRET", SECRET),
            ("ACCESS_TOKEN_TTL_SECONDS", max.as_str()),
            ("REFRESH_TOKEN_TTL_SECONDS", max.as_str()),
        ])
        .unwrap();
        assert_eq!(config.refresh_token_ttl_seconds, MAX_TOKEN_TTL_SECONDS);

        let too_long = (MAX_TOKEN_TTL_SECONDS + 1).to_string();
        for value in [too_long.as_str(), "10000000000000", "100000000000000000"] {
            for key in ["ACCESS_TOKEN_TTL_SECONDS", "REFRESH_TOKEN_TTL_SECONDS"] {
                let result = load(&[("SIGNING_SECRET", SECRET), (key, value)]);
                assert!(
                    matches!(result, Err(ConfigError::InvalidValue(_))),
                    "{}={} was accepted",
                    key,
                    value
                );
            }
        }
    }

    #[test]
    fn test_invalid_port_and_cost() {
        let result = load(&[("SIGNING_SECRET", SECRET), ("PORT", "99999")]);
        assert!(matches!(result, Err(ConfigError::InvalidPort(_))));

        let result = load(&[("SIGNING_SECRET", SECRET), ("BCRYPT_COST", "2")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_debug_masks_secret() {
        let config = load(&[("SIGNING_SECRET", SECRET)]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("****"));
    }
}
