// Session data sources
// A source yields the event schedule for a year and the lap table plus car
// telemetry for a single session.

pub mod jsonl_source;

pub use jsonl_source::{JsonlSessionSource, ScheduleEntry, SessionRecord};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::LapTraceError;
use crate::telemetry::{RawLap, TelemetrySample};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Race,
    Qualifying,
}

impl SessionKind {
    pub const ALL: [SessionKind; 2] = [SessionKind::Race, SessionKind::Qualifying];

    /// File stem used by the on-disk session cache
    pub fn file_stem(&self) -> &'static str {
        match self {
            SessionKind::Race => "race",
            SessionKind::Qualifying => "qualifying",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Race => write!(f, "Race"),
            SessionKind::Qualifying => write!(f, "Qualifying"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = LapTraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "r" | "race" => Ok(SessionKind::Race),
            "q" | "qualifying" | "qualification" => Ok(SessionKind::Qualifying),
            other => Err(LapTraceError::InvalidUserInput {
                field: "session".to_string(),
                reason: format!("unknown session type '{other}', expected race or qualifying"),
            }),
        }
    }
}

/// Identifies one session of one event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub year: i32,
    pub event: String,
    pub kind: SessionKind,
}

impl SessionId {
    pub fn new(year: i32, event: &str, kind: SessionKind) -> Self {
        Self {
            year,
            event: event.to_string(),
            kind,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.event, self.year, self.kind)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub event_name: String,
    pub year: i32,
    pub kind: SessionKind,
    /// Scheduled race distance in laps, when known
    pub total_laps: Option<u32>,
}

impl SessionInfo {
    pub fn new(event_name: &str, year: i32, kind: SessionKind) -> Self {
        Self {
            event_name: event_name.to_string(),
            year,
            kind,
            total_laps: None,
        }
    }

    pub fn id(&self) -> SessionId {
        SessionId::new(self.year, &self.event_name, self.kind)
    }
}

/// A loaded session: the lap table and the car data behind each lap.
/// Read-only once built.
#[derive(Clone, Debug)]
pub struct Session {
    info: SessionInfo,
    laps: Vec<RawLap>,
    telemetry: HashMap<(String, u32), Vec<TelemetrySample>>,
}

impl Session {
    pub fn new(info: SessionInfo) -> Self {
        Self {
            info,
            laps: Vec::new(),
            telemetry: HashMap::new(),
        }
    }

    pub fn with_lap(mut self, lap: RawLap, samples: Vec<TelemetrySample>) -> Self {
        self.add_telemetry(&lap.driver, lap.lap_number, samples);
        self.add_lap(lap);
        self
    }

    pub fn add_lap(&mut self, lap: RawLap) {
        self.laps.push(lap);
    }

    pub fn add_telemetry(&mut self, driver: &str, lap_number: u32, samples: Vec<TelemetrySample>) {
        self.telemetry
            .entry((driver.to_string(), lap_number))
            .or_default()
            .extend(samples);
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn laps(&self) -> &[RawLap] {
        &self.laps
    }

    /// Driver codes in the order they first appear in the lap table
    pub fn drivers(&self) -> Vec<String> {
        self.laps.iter().map(|l| l.driver.clone()).unique().collect()
    }

    pub fn has_driver(&self, driver: &str) -> bool {
        self.laps.iter().any(|l| l.driver == driver)
    }

    /// Lap number of the final lap: the race distance if known, otherwise the
    /// highest lap number in the table
    pub fn final_lap_number(&self) -> Option<u32> {
        self.info
            .total_laps
            .or_else(|| self.laps.iter().map(|l| l.lap_number).max())
    }

    /// Car data keyed to a driver and lap number the lap table does not list,
    /// sorted by driver then lap
    pub fn unmatched_telemetry(&self) -> Vec<(&str, u32, &[TelemetrySample])> {
        self.telemetry
            .iter()
            .filter(|((driver, lap_number), _)| {
                !self
                    .laps
                    .iter()
                    .any(|l| &l.driver == driver && l.lap_number == *lap_number)
            })
            .map(|((driver, lap_number), samples)| {
                (driver.as_str(), *lap_number, samples.as_slice())
            })
            .sorted_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)))
            .collect()
    }

    /// Car data recorded during `lap`, empty when the source has none
    pub fn telemetry(&self, lap: &RawLap) -> &[TelemetrySample] {
        self.telemetry
            .get(&(lap.driver.clone(), lap.lap_number))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Provider of timing data. Implementations may be slow; callers load a
/// session once and reuse it for every comparison.
pub trait SessionSource {
    /// Event names for `year` in calendar order, testing excluded
    fn schedule(&self, year: i32) -> Result<Vec<String>, LapTraceError>;

    /// Load the lap table and telemetry of a session
    fn load(&self, id: &SessionId) -> Result<Session, LapTraceError>;
}

/// Normalize an event name for lookups and file naming
pub fn event_slug(event: &str) -> String {
    event
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Source backed by sessions built in memory.
#[derive(Default, Clone, Debug)]
pub struct MemorySessionSource {
    schedules: HashMap<i32, Vec<String>>,
    sessions: HashMap<(i32, String, SessionKind), Session>,
}

impl MemorySessionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: Session) -> Self {
        let info = session.info().clone();
        let events = self.schedules.entry(info.year).or_default();
        if !events.iter().any(|e| event_slug(e) == event_slug(&info.event_name)) {
            events.push(info.event_name.clone());
        }
        self.sessions
            .insert((info.year, event_slug(&info.event_name), info.kind), session);
        self
    }
}

impl SessionSource for MemorySessionSource {
    fn schedule(&self, year: i32) -> Result<Vec<String>, LapTraceError> {
        self.schedules
            .get(&year)
            .cloned()
            .ok_or(LapTraceError::ScheduleNotFound { year })
    }

    fn load(&self, id: &SessionId) -> Result<Session, LapTraceError> {
        let slug = event_slug(&id.event);
        if let Some(session) = self.sessions.get(&(id.year, slug.clone(), id.kind)) {
            return Ok(session.clone());
        }
        let event_known = self
            .schedules
            .get(&id.year)
            .is_some_and(|events| events.iter().any(|e| event_slug(e) == slug));
        if event_known {
            Err(LapTraceError::SessionNotFound {
                path: id.to_string(),
            })
        } else {
            Err(LapTraceError::EventNotFound {
                year: id.year,
                event: id.event.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> Session {
        let mut info = SessionInfo::new("Italian Grand Prix", 2023, SessionKind::Race);
        info.total_laps = Some(51);
        Session::new(info)
            .with_lap(
                RawLap::new("VER", 1, Some(88.)),
                vec![TelemetrySample::new(0., 0., 100., 100., 0.)],
            )
            .with_lap(RawLap::new("SAI", 1, Some(88.5)), Vec::new())
            .with_lap(RawLap::new("VER", 2, Some(85.)), Vec::new())
    }

    #[test]
    fn test_session_kind_parsing() {
        assert_eq!("Race".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("q".parse::<SessionKind>().unwrap(), SessionKind::Qualifying);
        assert_eq!(
            "Qualification".parse::<SessionKind>().unwrap(),
            SessionKind::Qualifying
        );
        assert!("sprint".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_event_slug() {
        assert_eq!(event_slug("São Paulo Grand Prix"), "são_paulo_grand_prix");
        assert_eq!(event_slug(" Emilia-Romagna GP "), "emilia_romagna_gp");
    }

    #[test]
    fn test_session_accessors() {
        let session = sample_session();
        assert_eq!(session.drivers(), vec!["VER".to_string(), "SAI".to_string()]);
        assert!(session.has_driver("SAI"));
        assert!(!session.has_driver("HAM"));
        assert_eq!(session.final_lap_number(), Some(51));
        assert_eq!(session.telemetry(&session.laps()[0]).len(), 1);
        assert!(session.telemetry(&session.laps()[1]).is_empty());
    }

    #[test]
    fn test_unmatched_telemetry() {
        let mut session = sample_session();
        assert!(session.unmatched_telemetry().is_empty());

        let sample = TelemetrySample::new(0., 0., 90., 20., 1.);
        session.add_telemetry("SAI", 7, vec![sample]);
        session.add_telemetry("HAM", 2, vec![sample, sample]);
        let unmatched = session.unmatched_telemetry();
        assert_eq!(unmatched.len(), 2);
        assert_eq!((unmatched[0].0, unmatched[0].1, unmatched[0].2.len()), ("HAM", 2, 2));
        assert_eq!((unmatched[1].0, unmatched[1].1, unmatched[1].2.len()), ("SAI", 7, 1));
    }

    #[test]
    fn test_final_lap_falls_back_to_lap_table() {
        let session = Session::new(SessionInfo::new("Test", 2022, SessionKind::Race))
            .with_lap(RawLap::new("ALO", 12, None), Vec::new())
            .with_lap(RawLap::new("ALO", 3, None), Vec::new());
        assert_eq!(session.final_lap_number(), Some(12));
    }

    #[test]
    fn test_memory_source_lookup() {
        let source = MemorySessionSource::new().with_session(sample_session());
        assert_eq!(
            source.schedule(2023).unwrap(),
            vec!["Italian Grand Prix".to_string()]
        );
        assert!(matches!(
            source.schedule(2019),
            Err(LapTraceError::ScheduleNotFound { year: 2019 })
        ));

        let loaded = source
            .load(&SessionId::new(2023, "italian grand prix", SessionKind::Race))
            .unwrap();
        assert_eq!(loaded.laps().len(), 3);
        assert!(matches!(
            source.load(&SessionId::new(2023, "Italian Grand Prix", SessionKind::Qualifying)),
            Err(LapTraceError::SessionNotFound { .. })
        ));
        assert!(matches!(
            source.load(&SessionId::new(2023, "Dutch Grand Prix", SessionKind::Race)),
            Err(LapTraceError::EventNotFound { year: 2023, .. })
        ));
    }
}
