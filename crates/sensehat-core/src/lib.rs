//! sensehat-core — shared library for the sensehat logger.
//!
//! Provides:
//! - `source` — environmental (Sense HAT) and host-metrics sample sources
//! - `models` — sample records produced by the sources
//! - `storage` — PostgreSQL persistence (schema provisioning, inserts)
//! - `sampler` — the fixed-interval sampling loop
//! - `config` — environment-driven settings

pub mod config;
pub mod models;
pub mod sampler;
pub mod source;
pub mod storage;
