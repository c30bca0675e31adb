use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use strum_macros::{Display, EnumString};
use tracing::info;

use crate::config::ConfigService;
use crate::dependency::{DependencyKind, DependencyOption};
use crate::error::BootstrapError;
use crate::lifecycle::{BootContext, InitStep, StepOutput};

use super::{Closer, Endpoint};

pub const SQL_DATABASE_NAME: &str = "SQL_DATABASE_NAME";
pub const SQL_DRIVER_NAME: &str = "SQL_DRIVER_NAME";
pub const SQL_DB_READ_HOST: &str = "SQL_DB_READ_HOST";
pub const SQL_DB_READ_USER: &str = "SQL_DB_READ_USER";
pub const SQL_DB_READ_PASSWORD: &str = "SQL_DB_READ_PASSWORD";
pub const SQL_DB_WRITE_HOST: &str = "SQL_DB_WRITE_HOST";
pub const SQL_DB_WRITE_USER: &str = "SQL_DB_WRITE_USER";
pub const SQL_DB_WRITE_PASSWORD: &str = "SQL_DB_WRITE_PASSWORD";
pub const SQL_MAX_CONNECTIONS: &str = "SQL_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Supported SQL drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SqlDriver {
    Postgres,
}

#[derive(Debug, Clone)]
pub struct SqlEndpointSettings {
    pub host: String,
    pub user: String,
    pub password: String,
}

/// Typed view over the environment keys the database pair consumes.
///
/// Parsing is pure: no connection is attempted until [`SqlDatabasePair::connect`],
/// so a missing database name fails before any network side effect.
#[derive(Debug, Clone)]
pub struct SqlSettings {
    pub driver: SqlDriver,
    pub database: String,
    pub read: SqlEndpointSettings,
    pub write: SqlEndpointSettings,
    pub max_connections: u32,
}

impl SqlSettings {
    pub fn from_config(config: &ConfigService) -> Result<Self, BootstrapError> {
        let database = config.require(SQL_DATABASE_NAME)?;
        let raw_driver = config.require(SQL_DRIVER_NAME)?;
        let driver = raw_driver
            .parse()
            .map_err(|_| BootstrapError::InvalidConfig {
                key: SQL_DRIVER_NAME,
                reason: format!("unsupported driver `{raw_driver}`"),
            })?;
        let read = Self::endpoint(config, SQL_DB_READ_HOST, SQL_DB_READ_USER, SQL_DB_READ_PASSWORD)?;
        let write = Self::endpoint(
            config,
            SQL_DB_WRITE_HOST,
            SQL_DB_WRITE_USER,
            SQL_DB_WRITE_PASSWORD,
        )?;
        let max_connections = match config.get(SQL_MAX_CONNECTIONS) {
            Some(raw) => raw.parse().map_err(|_| BootstrapError::InvalidConfig {
                key: SQL_MAX_CONNECTIONS,
                reason: format!("`{raw}` is not a valid pool size"),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        Ok(Self {
            driver,
            database,
            read,
            write,
            max_connections,
        })
    }

    fn endpoint(
        config: &ConfigService,
        host: &'static str,
        user: &'static str,
        password: &'static str,
    ) -> Result<SqlEndpointSettings, BootstrapError> {
        Ok(SqlEndpointSettings {
            host: config.require(host)?,
            user: config.require(user)?,
            password: config.require(password)?,
        })
    }

    pub fn read_options(&self) -> PgConnectOptions {
        self.options(&self.read)
    }

    pub fn write_options(&self) -> PgConnectOptions {
        self.options(&self.write)
    }

    // TLS stays off unless the deployment terminates it in front of the pool.
    fn options(&self, endpoint: &SqlEndpointSettings) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&endpoint.host)
            .username(&endpoint.user)
            .password(&endpoint.password)
            .database(&self.database)
            .ssl_mode(PgSslMode::Disable)
    }
}

/// Read/write split database handle.
///
/// Callers must not assume the two pools share a physical connection; the read
/// side typically targets a replica.
pub trait SqlDatabase: Closer {
    fn read(&self) -> &PgPool;
    fn write(&self) -> &PgPool;
}

pub struct SqlDatabasePair {
    read: PgPool,
    write: PgPool,
}

impl SqlDatabasePair {
    /// Wrap existing pools, e.g. ones opened lazily in tests.
    pub fn new(read: PgPool, write: PgPool) -> Self {
        Self { read, write }
    }

    pub async fn open(ctx: &BootContext) -> Result<Self, BootstrapError> {
        let settings = SqlSettings::from_config(ctx.config())?;
        Self::connect(&settings).await
    }

    /// Opens both pools eagerly. A write-side failure releases the
    /// already-open read pool before propagating, so no partial pair is ever
    /// exposed.
    pub async fn connect(settings: &SqlSettings) -> Result<Self, BootstrapError> {
        let read = Self::pool(settings, Endpoint::Read, settings.read_options()).await?;
        let write = match Self::pool(settings, Endpoint::Write, settings.write_options()).await {
            Ok(pool) => pool,
            Err(err) => {
                read.close().await;
                return Err(err);
            }
        };
        info!(database = %settings.database, "sql: read/write pair connected");
        Ok(Self { read, write })
    }

    async fn pool(
        settings: &SqlSettings,
        endpoint: Endpoint,
        options: PgConnectOptions,
    ) -> Result<PgPool, BootstrapError> {
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await
            .map_err(|err| BootstrapError::connection(DependencyKind::SqlDatabase, endpoint, err))
    }

    pub fn init_step() -> InitStep {
        InitStep::new(DependencyKind::SqlDatabase, |ctx| async move {
            let pair = Arc::new(Self::open(&ctx).await?);
            Ok(StepOutput {
                handle: pair.clone(),
                option: DependencyOption::SqlDatabase(pair),
            })
        })
    }
}

#[async_trait]
impl Closer for SqlDatabasePair {
    fn kind(&self) -> DependencyKind {
        DependencyKind::SqlDatabase
    }

    /// Read closes before write; both are always attempted.
    async fn close(&self) -> anyhow::Result<()> {
        self.read.close().await;
        self.write.close().await;
        info!("sql: read/write pair closed");
        Ok(())
    }
}

impl SqlDatabase for SqlDatabasePair {
    fn read(&self) -> &PgPool {
        &self.read
    }

    fn write(&self) -> &PgPool {
        &self.write
    }
}
