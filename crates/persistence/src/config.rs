//! Store selection and construction.
//!
//! [`StoreConfig`] names the backend to use together with that backend's
//! settings, and [`open_store`] turns it into a ready-to-use
//! [`AuditStore`] with an initialized schema.
//!
//! # Example
//!
//! ```no_run
//! use auditum_persistence::config::{open_store, StoreConfig};
//! use auditum_persistence::core::Backend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // SQLite at ":memory:"
//! let config = StoreConfig::default();
//! config.validate().map_err(|errors| errors.join("; "))?;
//!
//! let store = open_store(&config).await?;
//! assert_eq!(store.name(), "sqlite");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{AuditStore, Backend};
#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
use crate::error::{BackendError, StorageError};
use crate::error::StorageResult;

#[cfg(feature = "postgres")]
use crate::backends::postgres::{PostgresBackend, PostgresConfig};
#[cfg(feature = "sqlite")]
use crate::backends::sqlite::{SqliteBackend, SqliteBackendConfig};

/// The backend a store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Shared tables in a SQLite database.
    #[default]
    Sqlite,
    /// PostgreSQL, optionally with per-project partitions.
    Postgres,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Sqlite => write!(f, "sqlite"),
            StoreKind::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            other => Err(format!(
                "unknown store '{}', expected 'sqlite' or 'postgres'",
                other
            )),
        }
    }
}

/// SQLite store settings.
#[cfg(feature = "sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Pool and connection settings.
    #[serde(default)]
    pub backend: SqliteBackendConfig,
}

#[cfg(feature = "sqlite")]
fn default_database_path() -> String {
    ":memory:".to_string()
}

#[cfg(feature = "sqlite")]
impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            backend: SqliteBackendConfig::default(),
        }
    }
}

/// Configuration for opening an [`AuditStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to open.
    #[serde(default)]
    pub kind: StoreKind,

    /// Used when `kind` is [`StoreKind::Sqlite`].
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub sqlite: SqliteStoreConfig,

    /// Used when `kind` is [`StoreKind::Postgres`].
    #[cfg(feature = "postgres")]
    #[serde(default)]
    pub postgres: PostgresConfig,
}

impl StoreConfig {
    /// Validates the settings of the selected backend and returns every
    /// problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.kind {
            StoreKind::Sqlite => {
                #[cfg(feature = "sqlite")]
                {
                    let sqlite = &self.sqlite;
                    if sqlite.database_path.trim().is_empty() {
                        errors.push("SQLite database path cannot be empty".to_string());
                    }
                    if sqlite.backend.max_connections == 0 {
                        errors.push("SQLite max connections cannot be 0".to_string());
                    }
                    if sqlite.backend.min_connections > sqlite.backend.max_connections {
                        errors.push(
                            "SQLite min connections cannot exceed max connections".to_string(),
                        );
                    }
                }
            }
            StoreKind::Postgres => {
                #[cfg(feature = "postgres")]
                {
                    let postgres = &self.postgres;
                    if postgres.host.trim().is_empty() {
                        errors.push("PostgreSQL host cannot be empty".to_string());
                    }
                    if postgres.port == 0 {
                        errors.push("PostgreSQL port cannot be 0".to_string());
                    }
                    if postgres.dbname.trim().is_empty() {
                        errors.push("PostgreSQL database name cannot be empty".to_string());
                    }
                    if postgres.max_connections == 0 {
                        errors.push("PostgreSQL max connections cannot be 0".to_string());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn not_compiled(kind: StoreKind) -> StorageError {
    StorageError::Backend(BackendError::UnsupportedCapability {
        backend_name: kind.to_string(),
        capability: format!("{} store (build with the '{}' feature)", kind, kind),
    })
}

/// Opens the configured store and initializes its schema.
pub async fn open_store(config: &StoreConfig) -> StorageResult<Box<dyn AuditStore>> {
    match config.kind {
        StoreKind::Sqlite => open_sqlite(config).await,
        StoreKind::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &StoreConfig) -> StorageResult<Box<dyn AuditStore>> {
    let backend =
        SqliteBackend::with_config(&config.sqlite.database_path, config.sqlite.backend.clone())?;
    backend.migrate().await?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_config: &StoreConfig) -> StorageResult<Box<dyn AuditStore>> {
    Err(not_compiled(StoreKind::Sqlite))
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &StoreConfig) -> StorageResult<Box<dyn AuditStore>> {
    let backend = PostgresBackend::new(config.postgres.clone()).await?;
    backend.migrate().await?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_config: &StoreConfig) -> StorageResult<Box<dyn AuditStore>> {
    Err(not_compiled(StoreKind::Postgres))
}
