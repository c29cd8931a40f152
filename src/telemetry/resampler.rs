use itertools::{Itertools, MinMaxResult};
use log::{debug, warn};

use super::{NormalizedSeries, TelemetrySample, position_grid};

/// A sample with every channel present, position already normalized.
#[derive(Clone, Copy, Debug)]
struct ValidSample {
    time_s: f64,
    distance_m: f64,
    speed_kph: f64,
    throttle_pct: f64,
    brake: f64,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl ValidSample {
    fn from_sample(sample: &TelemetrySample) -> Option<Self> {
        Some(Self {
            time_s: finite(sample.time_s)?,
            distance_m: finite(sample.distance_m)?,
            speed_kph: finite(sample.speed_kph)?,
            throttle_pct: finite(sample.throttle_pct)?,
            brake: finite(sample.brake)?,
        })
    }
}

/// Resample one lap of telemetry onto a grid of `resolution` evenly spaced
/// positions over [0, 1].
///
/// Samples missing any channel are dropped. Laps left with fewer than two
/// samples, or where the car never moved, produce the all-zero
/// [`NormalizedSeries::degenerate`] series instead of an error.
pub fn resample_lap(samples: &[TelemetrySample], resolution: usize) -> NormalizedSeries {
    let valid = samples
        .iter()
        .filter_map(ValidSample::from_sample)
        .collect_vec();

    if valid.len() < 2 {
        warn!(
            "Lap has {} usable telemetry samples out of {}, using empty series",
            valid.len(),
            samples.len()
        );
        return NormalizedSeries::degenerate(resolution);
    }

    let (min_distance, max_distance) = match valid.iter().map(|s| s.distance_m).minmax() {
        MinMaxResult::MinMax(min, max) => (min, max),
        MinMaxResult::OneElement(d) => (d, d),
        MinMaxResult::NoElements => return NormalizedSeries::degenerate(resolution),
    };
    let span = max_distance - min_distance;
    if span <= 0. {
        warn!("Lap distance never advanced past {min_distance}m, using empty series");
        return NormalizedSeries::degenerate(resolution);
    }

    let start_time = valid[0].time_s;
    let points = valid
        .iter()
        .map(|s| ((s.distance_m - min_distance) / span, s))
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .collect_vec();

    let xp = points.iter().map(|(s, _)| *s).collect_vec();
    let channel = |value: fn(&ValidSample) -> f64| -> Vec<f64> {
        points.iter().map(|(_, sample)| value(sample)).collect()
    };

    let position = position_grid(resolution);
    let speed = interpolate(&position, &xp, &channel(|s| s.speed_kph));
    let throttle = interpolate(&position, &xp, &channel(|s| s.throttle_pct));
    let brake = interpolate(&position, &xp, &channel(|s| s.brake));
    let elapsed_time = interpolate(
        &position,
        &xp,
        &points
            .iter()
            .map(|(_, sample)| sample.time_s - start_time)
            .collect_vec(),
    );

    debug!(
        "Resampled {} samples covering {:.1}m onto {} grid points",
        valid.len(),
        span,
        resolution
    );

    NormalizedSeries {
        position,
        speed,
        throttle,
        brake,
        elapsed_time,
        lap_distance_m: span,
    }
}

/// Piecewise linear interpolation of `(xp, fp)` at each of `x`.
///
/// `xp` must be sorted ascending. Points outside `xp` take the value of the
/// nearest end.
pub(crate) fn interpolate(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let (Some(first_x), Some(last_x)) = (xp.first(), xp.last()) else {
        return vec![0.; x.len()];
    };
    let first_value = fp[0];
    let last_value = fp[fp.len() - 1];

    x.iter()
        .map(|&at| {
            if at <= *first_x {
                return first_value;
            }
            if at >= *last_x {
                return last_value;
            }
            // xp[upper - 1] <= at < xp[upper]
            let upper = xp.partition_point(|p| *p <= at);
            let lower = upper - 1;
            let fraction = (at - xp[lower]) / (xp[upper] - xp[lower]);
            fp[lower] + fraction * (fp[upper] - fp[lower])
        })
        .collect()
}
