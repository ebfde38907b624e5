use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Daily discovery allowance and the calendar it is counted in.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub daily_limit: u32,
    pub utc_offset_hours: i8,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            daily_limit: 10,
            utc_offset_hours: 7,
        }
    }
}

/// How client-facing failures are mapped onto HTTP status codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// Validation failures are 400, every other failure is 500.
    #[default]
    Compatible,
    /// Each error kind gets its own status (401/404/409/429/500).
    Distinct,
}

impl FromStr for StatusMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatible" => Ok(Self::Compatible),
            "distinct" => Ok(Self::Distinct),
            other => anyhow::bail!("unknown status mode {other:?}, expected compatible|distinct"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub discovery: DiscoveryConfig,
    pub status_mode: StatusMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", 10)?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "minder".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "minder-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60)?,
        };
        let discovery = DiscoveryConfig {
            daily_limit: env_or("DISCOVERY_DAILY_LIMIT", 10)?,
            utc_offset_hours: env_or("SERVICE_UTC_OFFSET_HOURS", 7)?,
        };
        if !(-12..=14).contains(&discovery.utc_offset_hours) {
            anyhow::bail!(
                "SERVICE_UTC_OFFSET_HOURS must be within -12..=14, got {}",
                discovery.utc_offset_hours
            );
        }
        let status_mode = env_or("ERROR_STATUS_MODE", StatusMode::Compatible)?;

        Ok(Self {
            database_url,
            max_connections,
            jwt,
            discovery,
            status_mode,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
