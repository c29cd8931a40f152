// Driver comparison pipeline
// Lap selection -> resampling -> averaging -> delta and segment analysis

pub mod comparison;
pub mod lap_selector;

pub use comparison::{
    ComparisonResult, Segment, SegmentRules, SpeedAdvantage, TrackCharacter, compare_series,
};
pub use lap_selector::{LapSelection, LapSelector, race_pace_laps};

use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::LapTraceError;
use crate::session::{Session, SessionId, SessionInfo, SessionSource};
use crate::telemetry::{GRID_RESOLUTION, NormalizedSeries, average_series, resample_lap};

/// Tunables of the comparison pipeline
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisParams {
    pub grid_resolution: usize,
    pub full_throttle_pct: f64,
    pub min_straight_fraction: f64,
    pub race_pace_window_s: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            grid_resolution: GRID_RESOLUTION,
            full_throttle_pct: comparison::FULL_THROTTLE_PCT,
            min_straight_fraction: comparison::MIN_STRAIGHT_FRACTION,
            race_pace_window_s: lap_selector::RACE_PACE_WINDOW_S,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), LapTraceError> {
        let invalid = |field: &str, reason: &str| {
            Err(LapTraceError::InvalidUserInput {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };
        if self.grid_resolution < 2 {
            return invalid("grid_resolution", "must be at least 2");
        }
        if !(0. ..=100.).contains(&self.full_throttle_pct) {
            return invalid("full_throttle_pct", "must be between 0 and 100");
        }
        if !(0. ..=1.).contains(&self.min_straight_fraction) {
            return invalid("min_straight_fraction", "must be between 0 and 1");
        }
        if self.race_pace_window_s.is_nan() || self.race_pace_window_s < 0. {
            return invalid("race_pace_window_s", "must not be negative");
        }
        Ok(())
    }

    pub fn segment_rules(&self) -> SegmentRules {
        SegmentRules {
            full_throttle_pct: self.full_throttle_pct,
            min_straight_fraction: self.min_straight_fraction,
        }
    }
}

/// Two drivers and how to pick their laps
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRequest {
    pub driver1: String,
    pub driver2: String,
    pub selection: LapSelection,
}

impl ComparisonRequest {
    pub fn new(driver1: &str, driver2: &str, selection: LapSelection) -> Self {
        Self {
            driver1: driver1.to_string(),
            driver2: driver2.to_string(),
            selection,
        }
    }
}

/// One driver's trace and the laps it was built from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DriverTrace {
    pub driver: String,
    pub laps_used: Vec<u32>,
    pub series: NormalizedSeries,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComparisonReport {
    pub session: SessionInfo,
    pub selection: LapSelection,
    pub laps_used1: Vec<u32>,
    pub laps_used2: Vec<u32>,
    pub result: ComparisonResult,
}

/// Build the trace of `driver` under `selection`: one resampled lap, or the
/// average of every selected lap.
pub fn driver_trace(
    session: &Session,
    selector: &LapSelector<'_>,
    driver: &str,
    selection: LapSelection,
    params: &AnalysisParams,
) -> Result<DriverTrace, LapTraceError> {
    // an absent driver simply has no race pace laps
    if selection != LapSelection::RacePace && !session.has_driver(driver) {
        return Err(LapTraceError::UnknownDriver {
            driver: driver.to_string(),
        });
    }

    let laps = selector.select(driver, selection)?;
    let mut resampled = laps
        .iter()
        .map(|lap| resample_lap(session.telemetry(lap), params.grid_resolution))
        .collect_vec();
    let series = match resampled.len() {
        1 => resampled.remove(0),
        _ => average_series(&resampled, params.grid_resolution),
    };
    if series.is_degenerate() {
        warn!("No usable telemetry for {driver} ({})", selection.label());
    }

    Ok(DriverTrace {
        driver: driver.to_string(),
        laps_used: laps.iter().map(|l| l.lap_number).collect(),
        series,
    })
}

/// Compare two drivers within an already loaded session
pub fn compare_drivers(
    session: &Session,
    request: &ComparisonRequest,
    params: &AnalysisParams,
) -> Result<ComparisonReport, LapTraceError> {
    params.validate()?;
    let selector = LapSelector::new(session, params.race_pace_window_s);
    let trace1 = driver_trace(session, &selector, &request.driver1, request.selection, params)?;
    let trace2 = driver_trace(session, &selector, &request.driver2, request.selection, params)?;

    let result = compare_series(
        &trace1.driver,
        &trace1.series,
        &trace2.driver,
        &trace2.series,
        &params.segment_rules(),
    );
    info!(
        "Compared {} vs {} ({}) over {} points",
        request.driver1,
        request.driver2,
        request.selection.label(),
        result.len()
    );

    Ok(ComparisonReport {
        session: session.info().clone(),
        selection: request.selection,
        laps_used1: trace1.laps_used,
        laps_used2: trace2.laps_used,
        result,
    })
}

/// Load a session from `source` and compare two drivers in it
pub fn compare_in_session(
    source: &dyn SessionSource,
    id: &SessionId,
    request: &ComparisonRequest,
    params: &AnalysisParams,
) -> Result<ComparisonReport, LapTraceError> {
    let session = source.load(id)?;
    compare_drivers(&session, request, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKind;
    use crate::telemetry::{RawLap, TelemetrySample};

    fn lap_samples(top_speed: f64, lap_time: f64) -> Vec<TelemetrySample> {
        (0..=100)
            .map(|i| {
                let fraction = i as f64 / 100.;
                let throttle = if fraction < 0.5 { 100. } else { 40. };
                TelemetrySample::new(
                    fraction * lap_time,
                    fraction * 4000.,
                    top_speed * (1. - fraction / 2.),
                    throttle,
                    0.,
                )
            })
            .collect()
    }

    fn params() -> AnalysisParams {
        AnalysisParams {
            grid_resolution: 201,
            ..Default::default()
        }
    }

    fn session() -> Session {
        let mut info = SessionInfo::new("British Grand Prix", 2024, SessionKind::Race);
        info.total_laps = Some(5);
        Session::new(info)
            .with_lap(RawLap::new("HAM", 1, Some(95.)), lap_samples(280., 95.))
            .with_lap(RawLap::new("HAM", 2, Some(90.)), lap_samples(300., 90.))
            .with_lap(RawLap::new("HAM", 3, Some(92.)), lap_samples(296., 92.))
            .with_lap(RawLap::new("HAM", 4, Some(91.)), Vec::new())
            .with_lap(RawLap::new("NOR", 1, Some(96.)), lap_samples(280., 96.))
            .with_lap(RawLap::new("NOR", 2, Some(91.)), lap_samples(298., 91.))
            .with_lap(RawLap::new("NOR", 3, None), lap_samples(290., 93.))
    }

    #[test]
    fn test_single_lap_comparison() {
        let session = session();
        let request = ComparisonRequest::new("HAM", "NOR", LapSelection::Single(2));
        let report = compare_drivers(&session, &request, &params()).unwrap();

        assert_eq!(report.laps_used1, vec![2]);
        assert_eq!(report.laps_used2, vec![2]);
        assert_eq!(report.result.len(), 201);
        // HAM is 1s quicker over the lap
        assert!((report.result.final_delta().unwrap() + 1.).abs() < 1e-9);
        assert_eq!(report.result.straight_advantage.driver.as_deref(), Some("HAM"));
        assert!((report.result.straight_advantage.magnitude_kph - 2. * 0.875).abs() < 0.1);
    }

    #[test]
    fn test_fastest_lap_comparison() {
        let report = compare_drivers(
            &session(),
            &ComparisonRequest::new("NOR", "HAM", LapSelection::Fastest),
            &params(),
        )
        .unwrap();
        assert_eq!(report.laps_used1, vec![2]);
        assert_eq!(report.laps_used2, vec![2]);
        assert!(report.result.final_delta().unwrap() > 0.);
    }

    #[test]
    fn test_race_pace_averages_laps() {
        let report = compare_drivers(
            &session(),
            &ComparisonRequest::new("HAM", "NOR", LapSelection::RacePace),
            &params(),
        )
        .unwrap();
        // lap 1 is the opening lap, lap 5 would be the last, NOR lap 3 is untimed
        assert_eq!(report.laps_used1, vec![2, 3, 4]);
        assert_eq!(report.laps_used2, vec![2]);
        // HAM lap 4 has no telemetry and contributes zeros to the average
        let expected_finish = (90. + 92. + 0.) / 3.;
        assert!((report.result.series1.elapsed_time[200] - expected_finish).abs() < 1e-9);
    }

    #[test]
    fn test_missing_laps_and_drivers() {
        let session = session();
        let missing_lap = compare_drivers(
            &session,
            &ComparisonRequest::new("HAM", "NOR", LapSelection::Single(4)),
            &params(),
        );
        assert!(matches!(
            missing_lap,
            Err(LapTraceError::LapNotFound { lap_number: 4, .. })
        ));

        let unknown = compare_drivers(
            &session,
            &ComparisonRequest::new("HAM", "BOT", LapSelection::Fastest),
            &params(),
        );
        assert!(matches!(unknown, Err(LapTraceError::UnknownDriver { .. })));
    }

    #[test]
    fn test_empty_race_pace_is_degenerate_not_error() {
        let mut info = SessionInfo::new("Monaco Grand Prix", 2024, SessionKind::Race);
        info.total_laps = Some(2);
        let session = Session::new(info)
            .with_lap(RawLap::new("LEC", 1, Some(80.)), lap_samples(250., 80.))
            .with_lap(RawLap::new("LEC", 2, Some(75.)), lap_samples(255., 75.))
            .with_lap(RawLap::new("PIA", 1, Some(80.5)), lap_samples(250., 80.5));
        let report = compare_drivers(
            &session,
            &ComparisonRequest::new("LEC", "PIA", LapSelection::RacePace),
            &params(),
        )
        .unwrap();
        assert!(report.result.series1.is_degenerate());
        assert!(report.result.series2.is_degenerate());
        assert!(report.result.delta_time.iter().all(|d| *d == 0.));
    }

    #[test]
    fn test_absent_driver_race_pace_is_degenerate() {
        let report = compare_drivers(
            &session(),
            &ComparisonRequest::new("HAM", "BOT", LapSelection::RacePace),
            &params(),
        )
        .unwrap();
        assert_eq!(report.laps_used1, vec![2, 3, 4]);
        assert!(report.laps_used2.is_empty());
        assert!(report.result.series2.is_degenerate());
        assert_eq!(report.result.len(), 201);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = AnalysisParams {
            grid_resolution: 1,
            ..Default::default()
        };
        assert!(matches!(
            compare_drivers(
                &session(),
                &ComparisonRequest::new("HAM", "NOR", LapSelection::Fastest),
                &bad
            ),
            Err(LapTraceError::InvalidUserInput { .. })
        ));
        let nan_window = AnalysisParams {
            race_pace_window_s: f64::NAN,
            ..Default::default()
        };
        assert!(nan_window.validate().is_err());
        assert!(AnalysisParams::default().validate().is_ok());
    }
}
