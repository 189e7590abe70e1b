//! DDL and insert statements for the two append-only sample tables.
//!
//! Every statement is idempotent, so the whole script may run on each
//! (re)connect.

pub const ENVIRONMENTAL_TABLE: &str = "environmental_samples";
pub const SYSTEM_TABLE: &str = "system_samples";

pub const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS environmental_samples (
    id          BIGSERIAL PRIMARY KEY,
    timestamp   TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
    temperature DOUBLE PRECISION NOT NULL,
    humidity    DOUBLE PRECISION NOT NULL,
    pressure    DOUBLE PRECISION NOT NULL,
    pitch       DOUBLE PRECISION NOT NULL,
    roll        DOUBLE PRECISION NOT NULL,
    yaw         DOUBLE PRECISION NOT NULL,
    accel_x     DOUBLE PRECISION NOT NULL,
    accel_y     DOUBLE PRECISION NOT NULL,
    accel_z     DOUBLE PRECISION NOT NULL,
    gyro_x      DOUBLE PRECISION NOT NULL,
    gyro_y      DOUBLE PRECISION NOT NULL,
    gyro_z      DOUBLE PRECISION NOT NULL,
    compass_x   DOUBLE PRECISION NOT NULL,
    compass_y   DOUBLE PRECISION NOT NULL,
    compass_z   DOUBLE PRECISION NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_environmental_samples_timestamp
    ON environmental_samples (timestamp);

CREATE TABLE IF NOT EXISTS system_samples (
    id               BIGSERIAL PRIMARY KEY,
    timestamp        TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
    cpu_temp         DOUBLE PRECISION,
    cpu_percent      DOUBLE PRECISION NOT NULL,
    cpu_count        INTEGER,
    cpu_freq_mhz     DOUBLE PRECISION,
    mem_total_gb     DOUBLE PRECISION NOT NULL,
    mem_used_gb      DOUBLE PRECISION NOT NULL,
    mem_available_gb DOUBLE PRECISION NOT NULL,
    mem_percent      DOUBLE PRECISION NOT NULL,
    disk_total_gb    DOUBLE PRECISION NOT NULL,
    disk_used_gb     DOUBLE PRECISION NOT NULL,
    disk_free_gb     DOUBLE PRECISION NOT NULL,
    disk_percent     DOUBLE PRECISION NOT NULL,
    load_avg_1min    DOUBLE PRECISION NOT NULL,
    load_avg_5min    DOUBLE PRECISION NOT NULL,
    load_avg_15min   DOUBLE PRECISION NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_system_samples_timestamp
    ON system_samples (timestamp);
";

/// Column order matches [`EnvironmentalSample::columns`](crate::models::EnvironmentalSample::columns).
pub const INSERT_ENVIRONMENTAL: &str = "
INSERT INTO environmental_samples (
    timestamp, temperature, humidity, pressure,
    pitch, roll, yaw,
    accel_x, accel_y, accel_z,
    gyro_x, gyro_y, gyro_z,
    compass_x, compass_y, compass_z
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";

pub const INSERT_SYSTEM: &str = "
INSERT INTO system_samples (
    timestamp, cpu_temp, cpu_percent, cpu_count, cpu_freq_mhz,
    mem_total_gb, mem_used_gb, mem_available_gb, mem_percent,
    disk_total_gb, disk_used_gb, disk_free_gb, disk_percent,
    load_avg_1min, load_avg_5min, load_avg_15min
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)";
