use chrono::{DateTime, Utc};

/// Three-axis reading (acceleration, angular velocity or magnetic field).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Board orientation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// One environmental/orientation reading from the Sense HAT (or its
/// synthetic stand-in).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentalSample {
    /// Time the read completed.
    pub sampled_at: DateTime<Utc>,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// hPa.
    pub pressure: f64,
    pub orientation: Orientation,
    /// Linear acceleration in g.
    pub accel: Vector3,
    /// Angular velocity in deg/s.
    pub gyro: Vector3,
    /// Magnetic field in µT.
    pub compass: Vector3,
}

impl EnvironmentalSample {
    /// Values in insert-column order (temperature .. compass_z).
    pub fn columns(&self) -> [f64; 15] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.orientation.pitch,
            self.orientation.roll,
            self.orientation.yaw,
            self.accel.x,
            self.accel.y,
            self.accel.z,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
            self.compass.x,
            self.compass.y,
            self.compass.z,
        ]
    }
}
