use postgres::types::ToSql;
use postgres::{Client, Config, NoTls};
use tracing::{debug, info, warn};

use super::schema::{CREATE_SCHEMA, INSERT_ENVIRONMENTAL, INSERT_SYSTEM};
use super::{SampleSink, StoreConfig, StoreError, format_postgres_error};
use crate::models::{EnvironmentalSample, SystemSample};

type Params<'a> = Vec<&'a (dyn ToSql + Sync)>;

/// PostgreSQL-backed [`SampleSink`].
///
/// Holds at most one connection, opened lazily and reopened on the next
/// call after the server drops it. If schema provisioning has not succeeded
/// yet, it is retried on every fresh connection.
pub struct PgStore {
    config: StoreConfig,
    client: Option<Client>,
    schema_ready: bool,
    last_error: Option<String>,
}

impl PgStore {
    /// Creates a store without connecting.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: None,
            schema_ready: false,
            last_error: None,
        }
    }

    /// Returns the last error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    /// Establishes the connection if there is none or the previous one broke.
    ///
    /// Repeated calls reuse the live connection.
    pub fn connect(&mut self) -> Result<&mut Client, StoreError> {
        if self.client.as_ref().is_some_and(|c| c.is_closed()) {
            debug!("PostgreSQL: dropping closed connection");
            self.client = None;
        }

        if self.client.is_none() {
            let client = self.open().map_err(|msg| {
                self.last_error = Some(msg.clone());
                StoreError::Connection(msg)
            })?;
            info!("PostgreSQL: connected to {}", self.config);
            self.client = Some(client);
            self.last_error = None;

            if !self.schema_ready {
                // Failure was already logged; writes will report the missing tables.
                let _ = self.provision();
            }
        }

        self.client
            .as_mut()
            .ok_or_else(|| StoreError::Connection("not connected".to_string()))
    }

    /// Drops the connection.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            info!("PostgreSQL: connection closed");
        }
    }

    fn open(&self) -> Result<Client, String> {
        let mut config = Config::new();
        config
            .host(&self.config.host)
            .port(self.config.port)
            .dbname(&self.config.dbname)
            .user(&self.config.user)
            .password(&self.config.password)
            .application_name("sensehatd")
            .connect_timeout(self.config.connect_timeout);
        config.connect(NoTls).map_err(|e| format_postgres_error(&e))
    }

    fn provision(&mut self) -> Result<(), StoreError> {
        let Some(client) = self.client.as_mut() else {
            return Err(StoreError::Schema("not connected".to_string()));
        };
        match client.batch_execute(CREATE_SCHEMA) {
            Ok(()) => {
                self.schema_ready = true;
                debug!("PostgreSQL: schema ready");
                Ok(())
            }
            Err(e) => {
                let msg = format_postgres_error(&e);
                warn!("PostgreSQL: schema initialization failed ({})", msg);
                self.last_error = Some(msg.clone());
                Err(StoreError::Schema(msg))
            }
        }
    }

    /// Runs one INSERT inside its own transaction.
    ///
    /// Rolls back on failure. A failure that also closed the connection is
    /// reported as `Connection` and the client is dropped so the next call
    /// reconnects.
    fn insert(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<(), StoreError> {
        let client = self.connect()?;

        let result = (|| -> Result<(), postgres::Error> {
            let mut tx = client.transaction()?;
            match tx.execute(sql, params) {
                Ok(_) => tx.commit(),
                Err(e) => {
                    if let Err(rollback) = tx.rollback() {
                        debug!("PostgreSQL: rollback failed: {}", rollback);
                    }
                    Err(e)
                }
            }
        })();

        let Err(e) = result else {
            return Ok(());
        };

        let msg = format_postgres_error(&e);
        let closed = client.is_closed();
        self.last_error = Some(msg.clone());
        if closed {
            self.client = None;
            Err(StoreError::Connection(msg))
        } else {
            Err(StoreError::Write(msg))
        }
    }
}

impl SampleSink for PgStore {
    /// Connects and creates the tables.
    ///
    /// Failures are logged as warnings and returned; the store stays usable
    /// and provisioning is retried on the next connection.
    fn init_schema(&mut self) -> Result<(), StoreError> {
        if let Err(e) = self.connect() {
            warn!("PostgreSQL: schema initialization skipped ({})", e);
            return Err(StoreError::Schema(e.to_string()));
        }
        if self.schema_ready {
            return Ok(());
        }
        self.provision()
    }

    fn write_environmental(&mut self, sample: &EnvironmentalSample) -> Result<(), StoreError> {
        let timestamp = sample.sampled_at.naive_utc();
        let columns = sample.columns();

        let mut params: Params = Vec::with_capacity(columns.len() + 1);
        params.push(&timestamp);
        params.extend(columns.iter().map(|c| c as &(dyn ToSql + Sync)));

        self.insert(INSERT_ENVIRONMENTAL, &params)
    }

    fn write_system(&mut self, sample: &SystemSample) -> Result<(), StoreError> {
        let timestamp = sample.sampled_at.naive_utc();
        let memory = &sample.memory;
        let disk = &sample.disk;
        let load = &sample.load_average;

        let params: Params = vec![
            &timestamp,
            &sample.cpu_temperature,
            &sample.cpu_utilization_percent,
            &sample.logical_cpu_count,
            &sample.cpu_frequency_mhz,
            &memory.total_gb,
            &memory.used_gb,
            &memory.available_gb,
            &memory.percent,
            &disk.total_gb,
            &disk.used_gb,
            &disk.free_gb,
            &disk.percent,
            &load.one,
            &load.five,
            &load.fifteen,
        ];

        self.insert(INSERT_SYSTEM, &params)
    }

    fn close(&mut self) {
        PgStore::close(self);
    }
}
