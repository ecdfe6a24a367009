/// Configuration management
///
/// Loads configuration from environment variables (a `.env` file is honoured
/// in development) into a type-safe [`Config`].
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: Warm connections (default: 2)
/// - `DATABASE_CONNECT_TIMEOUT`: Acquire timeout in seconds (default: 30)
/// - `ARGON2_MEMORY_KIB`: Argon2id memory cost (default: 65536)
/// - `ARGON2_ITERATIONS`: Argon2id passes (default: 3)
/// - `ARGON2_PARALLELISM`: Argon2id lanes (default: 4)
/// - `QUOTA_EXCEEDANCE_POLICY`: `allow` or `deny` (default: allow)
/// - `DEFAULT_TIMEZONE`: IANA zone for new companies (default: UTC)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter (default: info)
///
/// # Example
///
/// ```no_run
/// use embrace_shared::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("pool size: {}", config.database.max_connections);
/// # Ok(())
/// # }
/// ```

use anyhow::{anyhow, bail, Context};
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

use crate::auth::password::Argon2Params;
use crate::db::pool::DatabaseConfig;
use crate::quota::ExceedancePolicy;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub credentials: Argon2Params,
    pub quota: QuotaConfig,
    pub log_format: LogFormat,
}

/// Quota accounting settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConfig {
    pub exceedance: ExceedancePolicy,

    /// Reference timezone for companies created without one
    pub default_timezone: Tz,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            exceedance: ExceedancePolicy::Allow,
            default_timezone: Tz::UTC,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or any variable has an
    /// invalid value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL environment variable is required"))?;

        let pool_defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", pool_defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", pool_defaults.min_connections)?,
            connect_timeout_seconds: parse_or(
                &lookup,
                "DATABASE_CONNECT_TIMEOUT",
                pool_defaults.connect_timeout_seconds,
            )?,
            ..pool_defaults
        };

        if database.min_connections > database.max_connections {
            bail!("DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS");
        }

        let argon2_defaults = Argon2Params::default();
        let credentials = Argon2Params {
            memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", argon2_defaults.memory_kib)?,
            iterations: parse_or(&lookup, "ARGON2_ITERATIONS", argon2_defaults.iterations)?,
            parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", argon2_defaults.parallelism)?,
            ..argon2_defaults
        };

        let exceedance = match lookup("QUOTA_EXCEEDANCE_POLICY") {
            Some(value) => ExceedancePolicy::from_str(&value).ok_or_else(|| {
                anyhow!("QUOTA_EXCEEDANCE_POLICY must be 'allow' or 'deny', got '{}'", value)
            })?,
            None => ExceedancePolicy::default(),
        };

        let default_timezone = match lookup("DEFAULT_TIMEZONE") {
            Some(value) => value
                .parse::<Tz>()
                .map_err(|_| anyhow!("DEFAULT_TIMEZONE '{}' is not a known IANA timezone", value))?,
            None => Tz::UTC,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        };

        Ok(Self {
            database,
            credentials,
            quota: QuotaConfig {
                exceedance,
                default_timezone,
            },
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has invalid value '{}'", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/embrace")]).unwrap();

        assert_eq!(config.database.url, "postgresql://localhost/embrace");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.credentials, Argon2Params::default());
        assert_eq!(config.quota, QuotaConfig::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_database_url_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/embrace"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("ARGON2_MEMORY_KIB", "19456"),
            ("ARGON2_ITERATIONS", "2"),
            ("ARGON2_PARALLELISM", "1"),
            ("QUOTA_EXCEEDANCE_POLICY", "deny"),
            ("DEFAULT_TIMEZONE", "Europe/Berlin"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.credentials.memory_kib, 19456);
        assert_eq!(config.credentials.iterations, 2);
        assert_eq!(config.credentials.parallelism, 1);
        assert_eq!(config.quota.exceedance, ExceedancePolicy::Deny);
        assert_eq!(config.quota.default_timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = ("DATABASE_URL", "postgresql://localhost/embrace");

        assert!(load(&[base, ("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
        assert!(load(&[base, ("QUOTA_EXCEEDANCE_POLICY", "warn")]).is_err());
        assert!(load(&[base, ("DEFAULT_TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(load(&[base, ("LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[
            base,
            ("DATABASE_MIN_CONNECTIONS", "20"),
            ("DATABASE_MAX_CONNECTIONS", "5")
        ])
        .is_err());
    }
}
