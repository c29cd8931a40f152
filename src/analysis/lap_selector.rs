use std::cell::OnceCell;

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::LapTraceError;
use crate::session::Session;
use crate::telemetry::RawLap;

/// Laps slower than the fastest race-pace lap by more than this are dropped
pub const RACE_PACE_WINDOW_S: f64 = 5.;

/// Which of a driver's laps feed a comparison
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LapSelection {
    /// One specific lap number
    Single(u32),
    /// The driver's quickest timed lap
    Fastest,
    /// Every representative race lap, averaged
    RacePace,
}

impl LapSelection {
    pub fn label(&self) -> String {
        match self {
            LapSelection::Single(lap_number) => format!("LAP {lap_number}"),
            LapSelection::Fastest => "FASTEST LAP".to_string(),
            LapSelection::RacePace => "RACE PACE".to_string(),
        }
    }
}

fn valid_lap_time(lap: &RawLap) -> Option<f64> {
    lap.lap_time_s.filter(|t| t.is_finite())
}

/// Laps representative of race pace across the whole session.
///
/// Drops the opening lap, the final lap, in/out laps and untimed laps, then
/// anything slower than the fastest remaining lap plus `window_s`.
pub fn race_pace_laps(laps: &[RawLap], final_lap: u32, window_s: f64) -> Vec<&RawLap> {
    let candidates = laps
        .iter()
        .filter(|l| l.lap_number > 1 && l.lap_number != final_lap)
        .filter(|l| !l.is_pit_lap())
        .filter(|l| valid_lap_time(l).is_some())
        .collect_vec();

    let Some(fastest) = candidates
        .iter()
        .filter_map(|l| valid_lap_time(l))
        .min_by(|a, b| a.total_cmp(b))
    else {
        return candidates;
    };

    let threshold = fastest + window_s;
    let pace_laps = candidates
        .into_iter()
        .filter(|l| valid_lap_time(l).is_some_and(|t| t <= threshold))
        .collect_vec();
    debug!(
        "Race pace threshold {:.3}s keeps {} of {} laps",
        threshold,
        pace_laps.len(),
        laps.len()
    );
    pace_laps
}

pub fn find_lap<'a>(
    laps: &'a [RawLap],
    driver: &str,
    lap_number: u32,
) -> Result<&'a RawLap, LapTraceError> {
    laps.iter()
        .find(|l| l.driver == driver && l.lap_number == lap_number)
        .ok_or_else(|| LapTraceError::LapNotFound {
            driver: driver.to_string(),
            lap_number,
        })
}

pub fn fastest_lap<'a>(laps: &'a [RawLap], driver: &str) -> Result<&'a RawLap, LapTraceError> {
    laps.iter()
        .filter(|l| l.driver == driver)
        .filter_map(|l| valid_lap_time(l).map(|t| (t, l)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, lap)| lap)
        .ok_or_else(|| LapTraceError::NoTimedLaps {
            driver: driver.to_string(),
        })
}

/// Picks laps out of one session. The race pace filter runs at most once
/// per selector, whichever driver asks first.
pub struct LapSelector<'a> {
    session: &'a Session,
    race_pace_window_s: f64,
    race_pace: OnceCell<Vec<&'a RawLap>>,
}

impl<'a> LapSelector<'a> {
    pub fn new(session: &'a Session, race_pace_window_s: f64) -> Self {
        Self {
            session,
            race_pace_window_s,
            race_pace: OnceCell::new(),
        }
    }

    pub fn race_pace(&self) -> &[&'a RawLap] {
        self.race_pace.get_or_init(|| {
            let final_lap = self.session.final_lap_number().unwrap_or(0);
            race_pace_laps(self.session.laps(), final_lap, self.race_pace_window_s)
        })
    }

    /// Laps of `driver` chosen by `selection`. Race pace may legitimately
    /// return no laps.
    pub fn select(
        &self,
        driver: &str,
        selection: LapSelection,
    ) -> Result<Vec<&'a RawLap>, LapTraceError> {
        let laps = self.session.laps();
        let selected = match selection {
            LapSelection::Single(lap_number) => vec![find_lap(laps, driver, lap_number)?],
            LapSelection::Fastest => vec![fastest_lap(laps, driver)?],
            LapSelection::RacePace => self
                .race_pace()
                .iter()
                .filter(|l| l.driver == driver)
                .copied()
                .collect(),
        };
        info!(
            "{} for {}: using laps {:?}",
            selection.label(),
            driver,
            selected.iter().map(|l| l.lap_number).collect_vec()
        );
        Ok(selected)
    }
}
