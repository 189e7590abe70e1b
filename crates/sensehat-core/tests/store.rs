//! PostgreSQL round-trip tests.
//!
//! Run only when `SENSEHAT_TEST_POSTGRES` holds a libpq-style connection
//! string, e.g. `host=localhost user=postgres password=postgres dbname=sensehat_test`.
//! Otherwise every test returns immediately.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use postgres::{Client, NoTls};

use sensehat_core::models::{
    DiskUsage, EnvironmentalSample, LoadAverage, MemoryUsage, Orientation, SystemSample, Vector3,
};
use sensehat_core::storage::{PgStore, SampleSink, StoreConfig, StoreError};

// Tests share the two tables and compare row counts.
static LOCK: Mutex<()> = Mutex::new(());

struct Fixture {
    store: PgStore,
    client: Client,
    _guard: MutexGuard<'static, ()>,
}

fn setup() -> Option<Fixture> {
    let conninfo = std::env::var("SENSEHAT_TEST_POSTGRES")
        .ok()
        .filter(|s| !s.trim().is_empty())?;
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let mut store = PgStore::new(StoreConfig::from_conninfo(&conninfo).unwrap());
    store.init_schema().unwrap();
    let client = Client::connect(&conninfo, NoTls).unwrap();

    Some(Fixture {
        store,
        client,
        _guard: guard,
    })
}

fn count(client: &mut Client, table: &str) -> i64 {
    client
        .query_one(format!("SELECT COUNT(*) FROM {}", table).as_str(), &[])
        .unwrap()
        .get(0)
}

fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap()
}

fn environmental_sample() -> EnvironmentalSample {
    EnvironmentalSample {
        sampled_at: at(1),
        temperature: 21.37,
        humidity: 44.5,
        pressure: 1012.83,
        orientation: Orientation {
            pitch: 1.25,
            roll: -3.5,
            yaw: 271.75,
        },
        accel: Vector3::new(0.0123, -0.0456, 0.9981),
        gyro: Vector3::new(0.87, -1.2, 0.05),
        compass: Vector3::new(22.4, -5.1, -41.9),
    }
}

fn system_sample(optional: bool) -> SystemSample {
    SystemSample {
        sampled_at: at(2),
        cpu_temperature: optional.then_some(48.31),
        cpu_utilization_percent: 12.5,
        logical_cpu_count: optional.then_some(4),
        cpu_frequency_mhz: optional.then_some(1500.0),
        memory: MemoryUsage {
            total_gb: 3.86,
            used_gb: 1.2,
            available_gb: 2.0,
            percent: 48.2,
        },
        disk: DiskUsage {
            total_gb: 32.0,
            used_gb: 16.0,
            free_gb: 15.0,
            percent: 51.6,
        },
        load_average: LoadAverage {
            one: 0.52,
            five: 0.58,
            fifteen: 0.59,
        },
    }
}

#[test]
fn test_init_schema_is_idempotent() {
    let Some(mut fx) = setup() else {
        return;
    };

    fx.store.init_schema().unwrap();
    fx.store.init_schema().unwrap();

    for table in ["environmental_samples", "system_samples"] {
        let tables: i64 = fx
            .client
            .query_one(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = $1",
                &[&table],
            )
            .unwrap()
            .get(0);
        assert_eq!(tables, 1, "{}", table);

        let indexes: i64 = fx
            .client
            .query_one(
                "SELECT COUNT(*) FROM pg_indexes WHERE tablename = $1 AND indexname = $2",
                &[&table, &format!("idx_{}_timestamp", table)],
            )
            .unwrap()
            .get(0);
        assert_eq!(indexes, 1, "{}", table);
    }
}

#[test]
fn test_environmental_round_trip() {
    let Some(mut fx) = setup() else {
        return;
    };
    let sample = environmental_sample();

    let before = count(&mut fx.client, "environmental_samples");
    fx.store.write_environmental(&sample).unwrap();
    assert_eq!(count(&mut fx.client, "environmental_samples"), before + 1);

    let row = fx
        .client
        .query_one(
            "SELECT timestamp, temperature, humidity, pressure, pitch, roll, yaw,
                    accel_x, accel_y, accel_z, gyro_x, gyro_y, gyro_z,
                    compass_x, compass_y, compass_z
             FROM environmental_samples ORDER BY id DESC LIMIT 1",
            &[],
        )
        .unwrap();

    let timestamp: NaiveDateTime = row.get(0);
    assert_eq!(timestamp, sample.sampled_at.naive_utc());

    let stored: Vec<f64> = (1..16usize).map(|i| row.get(i)).collect();
    for (got, want) in stored.iter().zip(sample.columns()) {
        assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
    }
}

#[test]
fn test_system_optionals_persist_as_null() {
    let Some(mut fx) = setup() else {
        return;
    };

    let before = count(&mut fx.client, "system_samples");
    fx.store.write_system(&system_sample(false)).unwrap();
    assert_eq!(count(&mut fx.client, "system_samples"), before + 1);

    let row = fx
        .client
        .query_one(
            "SELECT cpu_temp, cpu_count, cpu_freq_mhz, cpu_percent, mem_percent, load_avg_15min
             FROM system_samples ORDER BY id DESC LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(row.get::<_, Option<f64>>(0), None);
    assert_eq!(row.get::<_, Option<i32>>(1), None);
    assert_eq!(row.get::<_, Option<f64>>(2), None);
    assert_eq!(row.get::<_, f64>(3), 12.5);
    assert_eq!(row.get::<_, f64>(4), 48.2);
    assert_eq!(row.get::<_, f64>(5), 0.59);
}

#[test]
fn test_system_optionals_round_trip() {
    let Some(mut fx) = setup() else {
        return;
    };

    fx.store.write_system(&system_sample(true)).unwrap();

    let row = fx
        .client
        .query_one(
            "SELECT cpu_temp, cpu_count, cpu_freq_mhz FROM system_samples ORDER BY id DESC LIMIT 1",
            &[],
        )
        .unwrap();
    assert_eq!(row.get::<_, Option<f64>>(0), Some(48.31));
    assert_eq!(row.get::<_, Option<i32>>(1), Some(4));
    assert_eq!(row.get::<_, Option<f64>>(2), Some(1500.0));
}

#[test]
fn test_failed_write_is_rolled_back() {
    let Some(mut fx) = setup() else {
        return;
    };

    // Far outside the server's timestamp range.
    let bad = SystemSample {
        sampled_at: DateTime::<Utc>::MIN_UTC,
        ..system_sample(true)
    };

    let before = count(&mut fx.client, "system_samples");
    let err = fx.store.write_system(&bad).unwrap_err();
    assert!(matches!(err, StoreError::Write(_)), "{:?}", err);
    assert_eq!(count(&mut fx.client, "system_samples"), before);

    // Same connection keeps working.
    fx.store.write_system(&system_sample(true)).unwrap();
    assert_eq!(count(&mut fx.client, "system_samples"), before + 1);
}

#[test]
fn test_unreachable_store_then_recover() {
    let Some(mut fx) = setup() else {
        return;
    };

    let mut down = PgStore::new(StoreConfig {
        host: "127.0.0.1".into(),
        port: 1,
        connect_timeout: Duration::from_secs(1),
        ..StoreConfig::default()
    });
    assert!(matches!(down.init_schema(), Err(StoreError::Schema(_))));
    assert!(matches!(
        down.write_environmental(&environmental_sample()),
        Err(StoreError::Connection(_))
    ));

    // The fixture store reconnects after an explicit close.
    fx.store.close();
    let before = count(&mut fx.client, "environmental_samples");
    fx.store.write_environmental(&environmental_sample()).unwrap();
    assert_eq!(count(&mut fx.client, "environmental_samples"), before + 1);
}
