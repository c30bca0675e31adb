use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use thiserror::Error;
use tracing::info;

use crate::config::ConfigService;
use crate::dependency::{DependencyKind, DependencyOption};
use crate::error::BootstrapError;
use crate::lifecycle::{BootContext, InitStep, StepOutput};

use super::{Closer, Endpoint};

pub const REDIS_HOST: &str = "REDIS_HOST";
pub const REDIS_PORT: &str = "REDIS_PORT";
pub const REDIS_PASSWORD: &str = "REDIS_PASSWORD";
pub const REDIS_DB: &str = "REDIS_DB";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache command failed: {0}")]
    Command(#[from] RedisError),
}

/// Narrow typed view modules get over the cache connection.
///
/// Kept deliberately small; richer command surfaces belong to the client
/// library, not the container.
#[async_trait]
pub trait CachePool: Closer {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl CacheSettings {
    pub fn from_config(config: &ConfigService) -> Result<Self, BootstrapError> {
        let host = config.require(REDIS_HOST)?;
        let raw_port = config.get_or(REDIS_PORT, "6379");
        let port = raw_port.parse().map_err(|_| BootstrapError::InvalidConfig {
            key: REDIS_PORT,
            reason: format!("`{raw_port}` is not a valid port"),
        })?;
        let password = config.get(REDIS_PASSWORD).filter(|v| !v.is_empty());
        let raw_db = config.get_or(REDIS_DB, "0");
        let db = raw_db.parse().map_err(|_| BootstrapError::InvalidConfig {
            key: REDIS_DB,
            reason: format!("`{raw_db}` is not a valid database index"),
        })?;
        Ok(Self {
            host,
            port,
            password,
            db,
        })
    }

    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{password}@{}:{}/{}",
                self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Cache pool over a multiplexed async Redis connection.
pub struct RedisCachePool {
    connection: MultiplexedConnection,
}

impl RedisCachePool {
    /// Establishes the connection eagerly so an unreachable server fails
    /// startup instead of the first command.
    pub async fn open(ctx: &BootContext) -> Result<Self, BootstrapError> {
        let settings = CacheSettings::from_config(ctx.config())?;
        let client = redis::Client::open(settings.url()).map_err(|err| {
            BootstrapError::connection(DependencyKind::CachePool, Endpoint::Primary, err)
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| {
                BootstrapError::connection(DependencyKind::CachePool, Endpoint::Primary, err)
            })?;
        info!(host = %settings.host, port = settings.port, "redis: cache pool connected");
        Ok(Self { connection })
    }

    pub fn init_step() -> InitStep {
        InitStep::new(DependencyKind::CachePool, |ctx| async move {
            let pool = Arc::new(Self::open(&ctx).await?);
            Ok(StepOutput {
                handle: pool.clone(),
                option: DependencyOption::CachePool(pool),
            })
        })
    }
}

#[async_trait]
impl Closer for RedisCachePool {
    fn kind(&self) -> DependencyKind {
        DependencyKind::CachePool
    }

    async fn close(&self) -> anyhow::Result<()> {
        // The multiplexed connection tears down with its last clone.
        info!("redis: cache pool released");
        Ok(())
    }
}

#[async_trait]
impl CachePool for RedisCachePool {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        Ok(connection.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_password() {
        let settings = CacheSettings {
            host: "cache-1".to_string(),
            port: 6379,
            password: None,
            db: 0,
        };
        assert_eq!(settings.url(), "redis://cache-1:6379/0");
    }

    #[test]
    fn url_with_password() {
        let settings = CacheSettings {
            host: "cache-1".to_string(),
            port: 6380,
            password: Some("s3cret".to_string()),
            db: 2,
        };
        assert_eq!(settings.url(), "redis://:s3cret@cache-1:6380/2");
    }

    #[test]
    fn missing_host_names_the_key() {
        let config = ConfigService::from_pairs([(REDIS_PORT, "6379")]);
        let err = CacheSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingConfig(REDIS_HOST)));
    }

    #[test]
    fn malformed_port_is_rejected() {
        let config = ConfigService::from_pairs([(REDIS_HOST, "cache-1"), (REDIS_PORT, "striped")]);
        let err = CacheSettings::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidConfig {
                key: REDIS_PORT,
                ..
            }
        ));
    }

    #[test]
    fn defaults_apply_for_optional_keys() {
        let config = ConfigService::from_pairs([(REDIS_HOST, "cache-1")]);
        let settings = CacheSettings::from_config(&config).unwrap();
        assert_eq!(settings.port, 6379);
        assert_eq!(settings.db, 0);
        assert!(settings.password.is_none());
    }
}
