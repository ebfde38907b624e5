use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    calendar::ServiceCalendar,
    config::AppConfig,
    memory::MemoryStore,
    swipes::repo::{PgSwipeStore, SwipeStore},
    users::repo::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub swipes: Arc<dyn SwipeStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let calendar = ServiceCalendar::from_hours(config.discovery.utc_offset_hours)?;

        if config.database_url.starts_with("memory") {
            warn!("DATABASE_URL=memory: data lives in process memory and is lost on exit");
            let (state, _) = Self::in_memory(config)?;
            return Ok(state);
        }

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }
        info!(
            max_connections = config.max_connections,
            utc_offset = %calendar.offset(),
            "postgres store ready"
        );

        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgSwipeStore::new(db, calendar)),
            Arc::new(config),
        ))
    }

    /// State over a fresh [`MemoryStore`]; the store handle is returned for inspection.
    pub fn in_memory(config: AppConfig) -> anyhow::Result<(Self, MemoryStore)> {
        let calendar = ServiceCalendar::from_hours(config.discovery.utc_offset_hours)?;
        let store = MemoryStore::new(calendar);
        let state = Self::from_parts(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(config),
        );
        Ok((state, store))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        swipes: Arc<dyn SwipeStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            swipes,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> (Self, MemoryStore) {
        Self::in_memory(test_config(crate::config::StatusMode::Compatible)).expect("fake state")
    }
}

#[cfg(test)]
pub fn test_config(status_mode: crate::config::StatusMode) -> AppConfig {
    use crate::config::{DiscoveryConfig, JwtConfig};

    AppConfig {
        database_url: "memory".into(),
        max_connections: 1,
        jwt: JwtConfig {
            secret: "test".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_minutes: 5,
        },
        discovery: DiscoveryConfig::default(),
        status_mode,
    }
}
