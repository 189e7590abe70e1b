//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;
use crate::source::traits::FsUsage;

const GIB: u64 = 1 << 30;

impl MockFs {
    /// A Raspberry Pi 4 with a Sense HAT attached.
    ///
    /// Includes the five IIO devices of the board, the SoC thermal zone,
    /// cpufreq for four cores and a 32 GB root filesystem.
    ///
    /// Expected readings: 24.5 °C, 45 %, 1013.25 hPa, board lying flat
    /// (accel z = 1 g), CPU at 48.312 °C and 1500 MHz.
    pub fn sense_hat_pi() -> Self {
        let mut fs = Self::bare_host();

        fs.add_iio_device(
            "/sys",
            0,
            "hts221",
            &[
                ("in_humidityrelative_raw", "4500"),
                ("in_humidityrelative_offset", "0"),
                ("in_humidityrelative_scale", "10.000000"),
                ("in_temp_raw", "2400"),
                ("in_temp_offset", "50"),
                ("in_temp_scale", "10.000000"),
            ],
        );
        fs.add_iio_device(
            "/sys",
            1,
            "lps25h",
            &[
                ("in_pressure_raw", "1013250"),
                ("in_pressure_scale", "0.000100"),
                ("in_temp_raw", "1200"),
                ("in_temp_scale", "2.083333"),
            ],
        );
        fs.add_iio_device(
            "/sys",
            2,
            "lsm9ds1_accel",
            &[
                ("in_accel_x_raw", "0"),
                ("in_accel_y_raw", "0"),
                ("in_accel_z_raw", "16384"),
                ("in_accel_scale", "0.000598550"),
            ],
        );
        fs.add_iio_device(
            "/sys",
            3,
            "lsm9ds1_gyro",
            &[
                ("in_anglvel_x_raw", "100"),
                ("in_anglvel_y_raw", "0"),
                ("in_anglvel_z_raw", "-100"),
                ("in_anglvel_scale", "0.000152716"),
            ],
        );
        fs.add_iio_device(
            "/sys",
            4,
            "lsm9ds1_magn",
            &[
                ("in_magn_x_raw", "2000"),
                ("in_magn_y_raw", "0"),
                ("in_magn_z_raw", "-4000"),
                ("in_magn_x_scale", "0.000140"),
                ("in_magn_y_scale", "0.000140"),
                ("in_magn_z_scale", "0.000140"),
            ],
        );

        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "48312\n");
        for cpu in 0..4 {
            fs.add_file(
                format!("/sys/devices/system/cpu/cpu{}/cpufreq/scaling_cur_freq", cpu),
                "1500000\n",
            );
        }

        fs
    }

    /// A generic Linux host: `/proc` and a root filesystem, but no Sense HAT,
    /// no thermal zone, no cpufreq and no `cpu MHz` in `/proc/cpuinfo`.
    pub fn bare_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/loadavg", "0.52 0.58 0.59 1/190 4321\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:        4045760 kB
MemFree:         1048576 kB
MemAvailable:    2097152 kB
Buffers:          131072 kB
Cached:           786432 kB
SwapCached:            0 kB
Active:          1048576 kB
Inactive:         524288 kB
SwapTotal:        102396 kB
SwapFree:         102396 kB
Dirty:                64 kB
Writeback:             0 kB
Slab:             131072 kB
SReclaimable:      65536 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
BogoMIPS\t: 108.00
Features\t: fp asimd evtstrm crc32 cpuid
CPU implementer\t: 0x41

processor\t: 1
BogoMIPS\t: 108.00
Features\t: fp asimd evtstrm crc32 cpuid
CPU implementer\t: 0x41
",
        );
        fs.add_dir("/sys/devices/system/cpu");
        fs.add_mount(
            "/",
            FsUsage {
                total: 32 * GIB,
                free: 16 * GIB,
                available: 15 * GIB,
            },
        );

        fs
    }
}
