pub mod aggregator;
pub mod resampler;

pub use aggregator::average_series;
pub use resampler::resample_lap;

use serde::{Deserialize, Serialize};

/// Number of points on the normalized lap position grid.
pub const GRID_RESOLUTION: usize = 2000;

/// One driver's lap as recorded by the timing system.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawLap {
    /// Three letter driver code, e.g. "VER"
    pub driver: String,
    pub lap_number: u32,
    /// Lap time in seconds, missing when timing could not close the lap
    pub lap_time_s: Option<f64>,
    /// Session time in seconds when the car entered the pit lane on this lap
    pub pit_in_time_s: Option<f64>,
    /// Session time in seconds when the car left the pit lane on this lap
    pub pit_out_time_s: Option<f64>,
}

impl RawLap {
    pub fn new(driver: &str, lap_number: u32, lap_time_s: Option<f64>) -> Self {
        Self {
            driver: driver.to_string(),
            lap_number,
            lap_time_s,
            pit_in_time_s: None,
            pit_out_time_s: None,
        }
    }

    pub fn with_pit_in(mut self, pit_in_time_s: f64) -> Self {
        self.pit_in_time_s = Some(pit_in_time_s);
        self
    }

    pub fn with_pit_out(mut self, pit_out_time_s: f64) -> Self {
        self.pit_out_time_s = Some(pit_out_time_s);
        self
    }

    /// In-laps and out-laps are not representative of race pace
    pub fn is_pit_lap(&self) -> bool {
        self.pit_in_time_s.is_some() || self.pit_out_time_s.is_some()
    }
}

/// A single car data reading. Any channel may be missing.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    /// Seconds since the start of the lap recording
    pub time_s: Option<f64>,
    /// Cumulative distance travelled in meters
    pub distance_m: Option<f64>,
    pub speed_kph: Option<f64>,
    /// Throttle use. 0=off throttle to 100=full throttle
    pub throttle_pct: Option<f64>,
    /// Brake use, either 0/1 or a 0-100 pedal percentage depending on the series
    pub brake: Option<f64>,
}

impl TelemetrySample {
    pub fn new(time_s: f64, distance_m: f64, speed_kph: f64, throttle_pct: f64, brake: f64) -> Self {
        Self {
            time_s: Some(time_s),
            distance_m: Some(distance_m),
            speed_kph: Some(speed_kph),
            throttle_pct: Some(throttle_pct),
            brake: Some(brake),
        }
    }
}

/// Evenly spaced positions over [0, 1], both ends included.
pub fn position_grid(resolution: usize) -> Vec<f64> {
    match resolution {
        0 => Vec::new(),
        1 => vec![0.],
        _ => {
            let step = (resolution - 1) as f64;
            (0..resolution).map(|i| i as f64 / step).collect()
        }
    }
}

/// Telemetry channels of one lap (or an average of laps) sampled on the
/// shared position grid.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NormalizedSeries {
    pub position: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    /// Seconds since the first retained sample
    pub elapsed_time: Vec<f64>,
    /// Distance covered between the first and last retained sample
    pub lap_distance_m: f64,
}

impl NormalizedSeries {
    /// The "no signal" series: a populated grid with every channel at zero.
    pub fn degenerate(resolution: usize) -> Self {
        Self {
            position: position_grid(resolution),
            speed: vec![0.; resolution],
            throttle: vec![0.; resolution],
            brake: vec![0.; resolution],
            elapsed_time: vec![0.; resolution],
            lap_distance_m: 0.,
        }
    }

    pub fn len(&self) -> usize {
        self.position
            .len()
            .min(self.speed.len())
            .min(self.throttle.len())
            .min(self.brake.len())
            .min(self.elapsed_time.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_degenerate(&self) -> bool {
        [&self.speed, &self.throttle, &self.brake, &self.elapsed_time]
            .iter()
            .all(|channel| channel.iter().all(|v| *v == 0.))
    }

    /// Copy of the first `len` grid points of every channel.
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.len());
        Self {
            position: self.position[..len].to_vec(),
            speed: self.speed[..len].to_vec(),
            throttle: self.throttle[..len].to_vec(),
            brake: self.brake[..len].to_vec(),
            elapsed_time: self.elapsed_time[..len].to_vec(),
            lap_distance_m: self.lap_distance_m,
        }
    }
}
