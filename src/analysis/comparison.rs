use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::telemetry::NormalizedSeries;

/// Throttle percentage at or above which the car counts as flat out
pub const FULL_THROTTLE_PCT: f64 = 99.;
/// Shortest full-throttle run, as a fraction of the lap, that counts as a straight
pub const MIN_STRAIGHT_FRACTION: f64 = 0.05;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SegmentRules {
    pub full_throttle_pct: f64,
    pub min_straight_fraction: f64,
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self {
            full_throttle_pct: FULL_THROTTLE_PCT,
            min_straight_fraction: MIN_STRAIGHT_FRACTION,
        }
    }
}

/// A run of grid points, both ends inclusive
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub start_index: usize,
    pub end_index: usize,
    pub start_position: f64,
    pub end_position: f64,
}

impl Segment {
    pub fn span(&self) -> f64 {
        self.end_position - self.start_position
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackCharacter {
    Straight,
    Corner,
}

/// Average speed difference over part of the lap
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeedAdvantage {
    /// Driver carrying more speed, `None` when neither does
    pub driver: Option<String>,
    /// Absolute mean speed difference in km/h
    pub magnitude_kph: f64,
}

impl SpeedAdvantage {
    pub fn none() -> Self {
        Self {
            driver: None,
            magnitude_kph: 0.,
        }
    }
}

/// Everything derived from comparing driver 1 against driver 2
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub driver1: String,
    pub driver2: String,
    pub series1: NormalizedSeries,
    pub series2: NormalizedSeries,
    /// Driver 1 elapsed time minus driver 2 elapsed time at each grid point
    pub delta_time: Vec<f64>,
    /// Points where driver 1 is ahead (negative delta)
    pub gain_mask: Vec<bool>,
    /// Points where driver 1 is behind (positive delta)
    pub loss_mask: Vec<bool>,
    pub straights: Vec<Segment>,
    pub track_character: Vec<TrackCharacter>,
    pub straight_advantage: SpeedAdvantage,
    pub corner_advantage: SpeedAdvantage,
}

impl ComparisonResult {
    pub fn len(&self) -> usize {
        self.delta_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_time.is_empty()
    }

    /// Delta at the last grid point, i.e. over the whole lap
    pub fn final_delta(&self) -> Option<f64> {
        self.delta_time.last().copied()
    }
}

pub fn time_delta(time1: &[f64], time2: &[f64]) -> Vec<f64> {
    time1.iter().zip(time2).map(|(a, b)| a - b).collect()
}

/// Relative slack on the minimum straight span, absorbs grid rounding
const SPAN_TOLERANCE: f64 = 1e-9;

/// Full-throttle runs on `throttle` long enough to be straights.
///
/// A run is kept when its position span is at least `min_straight_fraction`
/// of the span of `position`. Runs landing exactly on the minimum are kept
/// wherever they start on the lap.
pub fn straight_segments(throttle: &[f64], position: &[f64], rules: &SegmentRules) -> Vec<Segment> {
    let len = throttle.len().min(position.len());
    if len == 0 {
        return Vec::new();
    }
    let total_span = position[len - 1] - position[0];
    let min_span = rules.min_straight_fraction * total_span - SPAN_TOLERANCE * total_span.abs();

    let mut segments = Vec::new();
    let mut run_start: Option<usize> = None;
    for i in 0..len {
        let flat_out = throttle[i] >= rules.full_throttle_pct;
        match (flat_out, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                segments.push((start, i - 1));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        segments.push((start, len - 1));
    }

    let (accepted, rejected): (Vec<_>, Vec<_>) = segments
        .into_iter()
        .map(|(start, end)| Segment {
            start_index: start,
            end_index: end,
            start_position: position[start],
            end_position: position[end],
        })
        .partition(|s| s.span() >= min_span);
    debug!(
        "Found {} straights, ignored {} short full-throttle runs",
        accepted.len(),
        rejected.len()
    );
    accepted
}

pub fn classify_track(len: usize, straights: &[Segment]) -> Vec<TrackCharacter> {
    let mut character = vec![TrackCharacter::Corner; len];
    for segment in straights {
        for c in character
            .iter_mut()
            .take(segment.end_index + 1)
            .skip(segment.start_index)
        {
            *c = TrackCharacter::Straight;
        }
    }
    character
}

/// Mean of `speed1 - speed2` over `indices`, attributed to whichever driver
/// is quicker.
pub fn speed_advantage(
    speed1: &[f64],
    speed2: &[f64],
    indices: impl IntoIterator<Item = usize>,
    driver1: &str,
    driver2: &str,
) -> SpeedAdvantage {
    let differences = indices
        .into_iter()
        .filter(|&i| i < speed1.len() && i < speed2.len())
        .map(|i| speed1[i] - speed2[i])
        .collect_vec();
    if differences.is_empty() {
        return SpeedAdvantage::none();
    }

    let mean = differences.iter().sum::<f64>() / differences.len() as f64;
    let driver = if mean > 0. {
        Some(driver1.to_string())
    } else if mean < 0. {
        Some(driver2.to_string())
    } else {
        None
    };
    SpeedAdvantage {
        driver,
        magnitude_kph: mean.abs(),
    }
}

/// Compare two resampled traces point by point.
///
/// Both traces are cut to the shorter length first. Straights are detected
/// on driver 1's throttle.
pub fn compare_series(
    driver1: &str,
    series1: &NormalizedSeries,
    driver2: &str,
    series2: &NormalizedSeries,
    rules: &SegmentRules,
) -> ComparisonResult {
    let len = series1.len().min(series2.len());
    if series1.len() != series2.len() {
        warn!(
            "Comparing traces of {} and {} points, truncating to {}",
            series1.len(),
            series2.len(),
            len
        );
    }
    let series1 = series1.truncated(len);
    let series2 = series2.truncated(len);

    let delta_time = time_delta(&series1.elapsed_time, &series2.elapsed_time);
    let gain_mask = delta_time.iter().map(|d| *d < 0.).collect_vec();
    let loss_mask = delta_time.iter().map(|d| *d > 0.).collect_vec();

    let straights = straight_segments(&series1.throttle, &series1.position, rules);
    let track_character = classify_track(len, &straights);
    let indices_of = |wanted: TrackCharacter| {
        track_character
            .iter()
            .positions(move |c| *c == wanted)
            .collect_vec()
    };

    let straight_advantage = speed_advantage(
        &series1.speed,
        &series2.speed,
        indices_of(TrackCharacter::Straight),
        driver1,
        driver2,
    );
    let corner_advantage = speed_advantage(
        &series1.speed,
        &series2.speed,
        indices_of(TrackCharacter::Corner),
        driver1,
        driver2,
    );

    ComparisonResult {
        driver1: driver1.to_string(),
        driver2: driver2.to_string(),
        series1,
        series2,
        delta_time,
        gain_mask,
        loss_mask,
        straights,
        track_character,
        straight_advantage,
        corner_advantage,
    }
}
