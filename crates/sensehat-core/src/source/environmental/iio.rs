//! Sense HAT sensors read through the Linux IIO sysfs interface.
//!
//! With the `rpi-sense` overlay loaded, the board's sensors show up as IIO
//! devices under `/sys/bus/iio/devices/iio:deviceN`:
//!
//! | Sensor  | `name`          | Channels                  | Unit        |
//! |---------|-----------------|---------------------------|-------------|
//! | HTS221  | `hts221`        | `humidityrelative`, `temp`| milli-%, m°C|
//! | LPS25H  | `lps25h`        | `pressure`                | kPa         |
//! | LSM9DS1 | `lsm9ds1_accel` | `accel_{x,y,z}`           | m/s²        |
//! | LSM9DS1 | `lsm9ds1_gyro`  | `anglvel_{x,y,z}`         | rad/s       |
//! | LSM9DS1 | `lsm9ds1_magn`  | `magn_{x,y,z}`            | gauss       |
//!
//! A channel's value is `(raw + offset) * scale`, where `offset` and `scale`
//! come from `in_<channel>_*` or, when shared, `in_<type>_*`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::models::{EnvironmentalSample, Orientation, Vector3};
use crate::source::SourceError;
use crate::source::traits::FileSystem;

const STANDARD_GRAVITY: f64 = 9.80665;
const MICROTESLA_PER_GAUSS: f64 = 100.0;
const HPA_PER_KPA: f64 = 10.0;

/// Device directories for each sensor role.
#[derive(Debug, Clone)]
struct IioDevices {
    humidity: PathBuf,
    pressure: PathBuf,
    accel: PathBuf,
    gyro: PathBuf,
    magn: PathBuf,
}

/// Hardware-backed environmental reader.
pub struct IioSenseHat<F: FileSystem> {
    fs: F,
    devices: IioDevices,
}

impl<F: FileSystem> IioSenseHat<F> {
    /// Locates the Sense HAT's IIO devices.
    ///
    /// Returns `SourceError::Unavailable` when the IIO bus is missing or any of
    /// the five sensors is not present.
    pub fn probe(fs: F, sys_path: &str) -> Result<Self, SourceError> {
        let bus = PathBuf::from(format!("{}/bus/iio/devices", sys_path));
        let mut entries = fs
            .read_dir(&bus)
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", bus.display(), e)))?;
        entries.sort();

        let mut humidity = None;
        let mut pressure = None;
        let mut accel = None;
        let mut gyro = None;
        let mut magn = None;

        for dir in entries {
            let Ok(name) = fs.read_to_string(&dir.join("name")) else {
                continue;
            };
            let name = name.trim();
            let slot = if name == "hts221" {
                &mut humidity
            } else if name.starts_with("lps25h") {
                &mut pressure
            } else if name.ends_with("_accel") {
                &mut accel
            } else if name.ends_with("_gyro") {
                &mut gyro
            } else if name.ends_with("_magn") {
                &mut magn
            } else {
                continue;
            };
            if slot.is_none() {
                debug!(device = %dir.display(), name, "found Sense HAT sensor");
                *slot = Some(dir);
            }
        }

        let missing: Vec<&str> = [
            ("hts221", humidity.is_none()),
            ("lps25h", pressure.is_none()),
            ("accelerometer", accel.is_none()),
            ("gyroscope", gyro.is_none()),
            ("magnetometer", magn.is_none()),
        ]
        .into_iter()
        .filter_map(|(sensor, absent)| absent.then_some(sensor))
        .collect();

        match (humidity, pressure, accel, gyro, magn) {
            (Some(humidity), Some(pressure), Some(accel), Some(gyro), Some(magn)) => Ok(Self {
                fs,
                devices: IioDevices {
                    humidity,
                    pressure,
                    accel,
                    gyro,
                    magn,
                },
            }),
            _ => Err(SourceError::Unavailable(format!(
                "IIO sensors missing: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Reads every sensor once.
    pub fn read(&self) -> Result<EnvironmentalSample, SourceError> {
        let temperature = self.channel(&self.devices.humidity, "temp", "temp")? / 1000.0;
        let humidity = self.channel(&self.devices.humidity, "humidityrelative", "humidityrelative")?
            / 1000.0;
        let pressure = self.channel(&self.devices.pressure, "pressure", "pressure")? * HPA_PER_KPA;

        let accel = self.vector(&self.devices.accel, "accel")?;
        let accel = Vector3::new(
            accel.x / STANDARD_GRAVITY,
            accel.y / STANDARD_GRAVITY,
            accel.z / STANDARD_GRAVITY,
        );

        let gyro = self.vector(&self.devices.gyro, "anglvel")?;
        let gyro = Vector3::new(gyro.x.to_degrees(), gyro.y.to_degrees(), gyro.z.to_degrees());

        let magn = self.vector(&self.devices.magn, "magn")?;
        let compass = Vector3::new(
            magn.x * MICROTESLA_PER_GAUSS,
            magn.y * MICROTESLA_PER_GAUSS,
            magn.z * MICROTESLA_PER_GAUSS,
        );

        Ok(EnvironmentalSample {
            sampled_at: Utc::now(),
            temperature,
            humidity,
            pressure,
            orientation: orientation(&accel, &compass),
            accel,
            gyro,
            compass,
        })
    }

    fn vector(&self, device: &Path, kind: &str) -> Result<Vector3, SourceError> {
        Ok(Vector3::new(
            self.channel(device, &format!("{}_x", kind), kind)?,
            self.channel(device, &format!("{}_y", kind), kind)?,
            self.channel(device, &format!("{}_z", kind), kind)?,
        ))
    }

    /// `(raw + offset) * scale` for one channel.
    fn channel(&self, device: &Path, channel: &str, kind: &str) -> Result<f64, SourceError> {
        let raw = self.read_number(&device.join(format!("in_{}_raw", channel)))?;
        let offset = self.attribute(device, channel, kind, "offset")?.unwrap_or(0.0);
        let scale = self.attribute(device, channel, kind, "scale")?.unwrap_or(1.0);
        Ok((raw + offset) * scale)
    }

    /// Per-channel attribute, falling back to the shared per-type one.
    fn attribute(
        &self,
        device: &Path,
        channel: &str,
        kind: &str,
        attr: &str,
    ) -> Result<Option<f64>, SourceError> {
        for name in [
            format!("in_{}_{}", channel, attr),
            format!("in_{}_{}", kind, attr),
        ] {
            let path = device.join(name);
            if self.fs.exists(&path) {
                return self.read_number(&path).map(Some);
            }
        }
        Ok(None)
    }

    fn read_number(&self, path: &Path) -> Result<f64, SourceError> {
        let content = self.fs.read_to_string(path)?;
        content.trim().parse::<f64>().map_err(|_| {
            SourceError::Parse(format!("{}: invalid value {:?}", path.display(), content.trim()))
        })
    }
}

/// Pitch and roll from gravity, tilt-compensated heading from the magnetometer.
///
/// Pitch and roll are in (-180, 180], yaw in [0, 360).
pub fn orientation(accel: &Vector3, magn: &Vector3) -> Orientation {
    let roll = accel.y.atan2(accel.z);
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt());

    let mx = magn.x * pitch.cos() + magn.z * pitch.sin();
    let my = magn.x * roll.sin() * pitch.sin() + magn.y * roll.cos()
        - magn.z * roll.sin() * pitch.cos();
    let yaw = (-my).atan2(mx).to_degrees().rem_euclid(360.0);

    Orientation {
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
        yaw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockFs;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_probe_finds_all_sensors() {
        let hat = IioSenseHat::probe(MockFs::sense_hat_pi(), "/sys").unwrap();
        assert!(hat.devices.humidity.ends_with("iio:device0"));
        assert!(hat.devices.pressure.ends_with("iio:device1"));
        assert!(hat.devices.magn.ends_with("iio:device4"));
    }

    #[test]
    fn test_probe_without_iio_bus() {
        let err = IioSenseHat::probe(MockFs::bare_host(), "/sys").err().unwrap();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_probe_reports_missing_sensors() {
        let mut fs = MockFs::bare_host();
        fs.add_iio_device("/sys", 0, "hts221", &[("in_temp_raw", "1")]);
        fs.add_iio_device("/sys", 1, "lsm9ds1_accel", &[("in_accel_x_raw", "1")]);

        let err = IioSenseHat::probe(fs, "/sys").err().unwrap();
        let msg = err.to_string();
        assert!(err.is_unavailable());
        assert!(msg.contains("lps25h"));
        assert!(msg.contains("gyroscope"));
        assert!(msg.contains("magnetometer"));
        assert!(!msg.contains("accelerometer"));
    }

    #[test]
    fn test_read_converts_units() {
        let hat = IioSenseHat::probe(MockFs::sense_hat_pi(), "/sys").unwrap();
        let sample = hat.read().unwrap();

        assert!(close(sample.temperature, 24.5, 1e-9));
        assert!(close(sample.humidity, 45.0, 1e-9));
        assert!(close(sample.pressure, 1013.25, 1e-6));

        assert!(close(sample.accel.x, 0.0, 1e-9));
        assert!(close(sample.accel.z, 1.0, 1e-3));

        assert!(close(sample.gyro.x, 0.875, 1e-3));
        assert!(close(sample.gyro.z, -0.875, 1e-3));

        // Per-axis magnetometer scale.
        assert!(close(sample.compass.x, 28.0, 1e-9));
        assert!(close(sample.compass.z, -56.0, 1e-9));

        // Lying flat, pointing magnetic north.
        assert!(close(sample.orientation.pitch, 0.0, 1e-9));
        assert!(close(sample.orientation.roll, 0.0, 1e-9));
        assert!(close(sample.orientation.yaw, 0.0, 1e-9));
    }

    #[test]
    fn test_read_fails_when_channel_disappears() {
        let mut fs = MockFs::sense_hat_pi();
        fs.remove_file("/sys/bus/iio/devices/iio:device1/in_pressure_raw");
        let hat = IioSenseHat::probe(fs, "/sys").unwrap();

        let err = hat.read().unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let mut fs = MockFs::sense_hat_pi();
        fs.add_file("/sys/bus/iio/devices/iio:device0/in_temp_raw", "warm\n");
        let hat = IioSenseHat::probe(fs, "/sys").unwrap();

        assert!(matches!(hat.read().unwrap_err(), SourceError::Parse(_)));
    }

    #[test]
    fn test_orientation_tilted() {
        // Rolled 90° onto its right side.
        let o = orientation(&Vector3::new(0.0, 1.0, 0.0), &Vector3::new(0.3, 0.0, 0.0));
        assert!(close(o.roll, 90.0, 1e-9));
        assert!(close(o.pitch, 0.0, 1e-9));

        // Nose down 30°.
        let o = orientation(
            &Vector3::new(-0.5, 0.0, 0.75f64.sqrt()),
            &Vector3::new(0.3, 0.0, 0.0),
        );
        assert!(close(o.pitch, 30.0, 1e-9));
    }

    #[test]
    fn test_orientation_heading() {
        let flat = Vector3::new(0.0, 0.0, 1.0);
        // Field along -y: facing east.
        let o = orientation(&flat, &Vector3::new(0.0, -0.3, 0.0));
        assert!(close(o.yaw, 90.0, 1e-9));
        let o = orientation(&flat, &Vector3::new(-0.3, 0.0, 0.0));
        assert!(close(o.yaw, 180.0, 1e-9));
        let o = orientation(&flat, &Vector3::new(0.0, 0.3, 0.0));
        assert!(close(o.yaw, 270.0, 1e-9));
    }
}
