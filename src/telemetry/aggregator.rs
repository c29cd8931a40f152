use log::{debug, warn};

use super::{NormalizedSeries, position_grid};

/// Point-wise arithmetic mean of several resampled laps.
///
/// An empty input yields the degenerate series for `resolution`. Inputs of
/// different lengths are averaged over their common prefix.
pub fn average_series(series: &[NormalizedSeries], resolution: usize) -> NormalizedSeries {
    let Some(first) = series.first() else {
        warn!("No laps to average, using empty series");
        return NormalizedSeries::degenerate(resolution);
    };

    let len = series.iter().map(NormalizedSeries::len).min().unwrap_or(0);
    if series.iter().any(|s| s.len() != len) {
        warn!("Averaging laps of different lengths, truncating to {len} points");
    }

    let count = series.len() as f64;
    let mean = |channel: fn(&NormalizedSeries) -> &Vec<f64>| -> Vec<f64> {
        (0..len)
            .map(|i| series.iter().map(|s| channel(s)[i]).sum::<f64>() / count)
            .collect()
    };

    debug!("Averaging {} laps over {} grid points", series.len(), len);

    NormalizedSeries {
        position: if first.position.len() >= len {
            first.position[..len].to_vec()
        } else {
            position_grid(len)
        },
        speed: mean(|s| &s.speed),
        throttle: mean(|s| &s.throttle),
        brake: mean(|s| &s.brake),
        elapsed_time: mean(|s| &s.elapsed_time),
        lap_distance_m: series.iter().map(|s| s.lap_distance_m).sum::<f64>() / count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series_with(speed: Vec<f64>, time: Vec<f64>) -> NormalizedSeries {
        let len = speed.len();
        NormalizedSeries {
            position: position_grid(len),
            throttle: speed.iter().map(|s| s / 4.).collect(),
            brake: vec![0.; len],
            speed,
            elapsed_time: time,
            lap_distance_m: 5000.,
        }
    }

    #[test]
    fn test_average_two_laps() {
        let a = series_with(vec![100., 200., 300.], vec![0., 1., 2.]);
        let b = series_with(vec![200., 300., 400.], vec![0., 2., 4.]);
        let avg = average_series(&[a, b], 3);
        assert_eq!(avg.speed, vec![150., 250., 350.]);
        assert_eq!(avg.elapsed_time, vec![0., 1.5, 3.]);
        assert_eq!(avg.position, position_grid(3));
        assert_eq!(avg.lap_distance_m, 5000.);
    }

    #[test]
    fn test_average_empty_is_degenerate() {
        let avg = average_series(&[], 25);
        assert!(avg.is_degenerate());
        assert_eq!(avg.len(), 25);
        assert_eq!(avg, NormalizedSeries::degenerate(25));
    }

    #[test]
    fn test_average_mismatched_lengths_uses_common_prefix() {
        let a = series_with(vec![100., 200., 300., 400.], vec![0., 1., 2., 3.]);
        let b = series_with(vec![300., 400.], vec![0., 1.]);
        let avg = average_series(&[a.clone(), b], 4);
        assert_eq!(avg.len(), 2);
        assert_eq!(avg.speed, vec![200., 300.]);
        assert_eq!(avg.position, a.position[..2].to_vec());
    }

    fn arb_series(len: usize) -> impl Strategy<Value = NormalizedSeries> {
        (
            prop::collection::vec(0.0f64..350., len),
            prop::collection::vec(0.0f64..100., len),
            prop::collection::vec(0.0f64..120., len),
        )
            .prop_map(|(speed, throttle, elapsed_time)| NormalizedSeries {
                position: position_grid(speed.len()),
                brake: throttle.iter().map(|t| if *t < 10. { 1. } else { 0. }).collect(),
                speed,
                throttle,
                elapsed_time,
                lap_distance_m: 4300.,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_single_lap_average_is_identity(series in arb_series(64)) {
            let avg = average_series(std::slice::from_ref(&series), 64);
            prop_assert_eq!(avg, series);
        }

        #[test]
        fn prop_average_is_order_independent(
            laps in prop::collection::vec(arb_series(32), 1..8),
            rotation in 0usize..8,
        ) {
            let forward = average_series(&laps, 32);
            let mut permuted = laps.clone();
            permuted.rotate_left(rotation % laps.len());
            permuted.reverse();
            let other = average_series(&permuted, 32);

            prop_assert_eq!(&forward.position, &other.position);
            for (a, b) in forward.speed.iter().zip(&other.speed) {
                prop_assert!((a - b).abs() < 1e-9);
            }
            for (a, b) in forward.elapsed_time.iter().zip(&other.elapsed_time) {
                prop_assert!((a - b).abs() < 1e-9);
            }
            for (a, b) in forward.throttle.iter().zip(&other.throttle) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
