//! Persistence of samples to PostgreSQL.
//!
//! [`PgStore`] owns the single connection to the store; the sampling loop
//! only sees it through [`SampleSink`], which lets tests drive the loop
//! against an in-memory sink.

mod pg;
pub mod schema;

pub use pg::PgStore;

use std::fmt;
use std::time::Duration;

use crate::models::{EnvironmentalSample, SystemSample};

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store unreachable or connection lost.
    Connection(String),
    /// Schema provisioning failed.
    Schema(String),
    /// Insert failed after a connection was obtained; the transaction was rolled back.
    Write(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "PostgreSQL connection: {}", msg),
            StoreError::Schema(msg) => write!(f, "PostgreSQL schema: {}", msg),
            StoreError::Write(msg) => write!(f, "PostgreSQL write: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Destination for samples.
pub trait SampleSink {
    /// Idempotently creates the sample tables.
    fn init_schema(&mut self) -> Result<(), StoreError>;

    /// Appends one environmental row.
    fn write_environmental(&mut self, sample: &EnvironmentalSample) -> Result<(), StoreError>;

    /// Appends one system row.
    fn write_system(&mut self, sample: &SystemSample) -> Result<(), StoreError>;

    /// Releases the connection, if any.
    fn close(&mut self) {}
}

/// Connection target for [`PgStore`].
#[derive(Clone, PartialEq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "sensehat".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Builds a config from a libpq-style key/value string
    /// (`host=... port=... dbname=... user=... password=...`).
    ///
    /// Unknown keys are ignored, missing keys keep their defaults.
    pub fn from_conninfo(conninfo: &str) -> Result<Self, StoreError> {
        let mut config = Self::default();
        for pair in conninfo.split_whitespace() {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(StoreError::Connection(format!("malformed conninfo: {}", pair)));
            };
            match key {
                "host" => config.host = value.to_string(),
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|_| StoreError::Connection(format!("invalid port: {}", value)))?
                }
                "dbname" => config.dbname = value.to_string(),
                "user" => config.user = value.to_string(),
                "password" => config.password = value.to_string(),
                "connect_timeout" => {
                    let secs: u64 = value.parse().map_err(|_| {
                        StoreError::Connection(format!("invalid connect_timeout: {}", value))
                    })?;
                    config.connect_timeout = Duration::from_secs(secs);
                }
                _ => {}
            }
        }
        Ok(config)
    }
}

// Password is elided so the config can be logged.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }
}

/// Condenses a driver error into one log-friendly line.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else if msg.contains("timed out") {
            "connection timed out".to_string()
        } else {
            msg
        }
    }
}
