// File-based session cache
//
// <root>/<year>/schedule.json             calendar for the year
// <root>/<year>/<event_slug>/<kind>.jsonl one SessionRecord per line

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{Session, SessionId, SessionInfo, SessionSource, event_slug};
use crate::errors::LapTraceError;
use crate::telemetry::{RawLap, TelemetrySample};

const SCHEDULE_FILE_NAME: &str = "schedule.json";

/// One line of a session file
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SessionRecord {
    Info(SessionInfo),
    Lap(RawLap),
    Telemetry {
        driver: String,
        lap_number: u32,
        samples: Vec<TelemetrySample>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScheduleEntry {
    pub name: String,
    #[serde(default)]
    pub is_testing: bool,
}

impl ScheduleEntry {
    pub fn event(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_testing: false,
        }
    }

    pub fn testing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_testing: true,
        }
    }
}

pub struct JsonlSessionSource {
    root: PathBuf,
}

impl JsonlSessionSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn default_data_dir() -> Result<PathBuf, LapTraceError> {
        let app_data_dir = dirs::data_dir().ok_or(LapTraceError::NoDataDir)?;
        Ok(app_data_dir.join("laptrace").join("sessions"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schedule_path(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string()).join(SCHEDULE_FILE_NAME)
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.root
            .join(id.year.to_string())
            .join(event_slug(&id.event))
            .join(format!("{}.jsonl", id.kind.file_stem()))
    }

    fn ensure_parent(path: &Path) -> Result<(), LapTraceError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| LapTraceError::SessionLoadError { source: e })?;
            }
        }
        Ok(())
    }

    /// Store the calendar of `year`
    pub fn write_schedule(&self, year: i32, entries: &[ScheduleEntry]) -> Result<(), LapTraceError> {
        let path = self.schedule_path(year);
        Self::ensure_parent(&path)?;
        let file = File::create(&path).map_err(|e| LapTraceError::SessionLoadError { source: e })?;
        serde_json::to_writer_pretty(file, entries).map_err(|e| LapTraceError::SessionParseError {
            reason: e.to_string(),
        })
    }

    /// Store a session so that a later `load` returns the same laps and telemetry
    pub fn write_session(&self, session: &Session) -> Result<(), LapTraceError> {
        let path = self.session_path(&session.info().id());
        Self::ensure_parent(&path)?;

        let mut records = vec![SessionRecord::Info(session.info().clone())];
        for lap in session.laps() {
            records.push(SessionRecord::Lap(lap.clone()));
            let samples = session.telemetry(lap);
            if !samples.is_empty() {
                records.push(SessionRecord::Telemetry {
                    driver: lap.driver.clone(),
                    lap_number: lap.lap_number,
                    samples: samples.to_vec(),
                });
            }
        }
        for (driver, lap_number, samples) in session.unmatched_telemetry() {
            if !samples.is_empty() {
                records.push(SessionRecord::Telemetry {
                    driver: driver.to_string(),
                    lap_number,
                    samples: samples.to_vec(),
                });
            }
        }
        serde_jsonlines::write_json_lines(&path, &records)
            .map_err(|e| LapTraceError::SessionLoadError { source: e })?;
        debug!("Wrote {} records to {:?}", records.len(), path);
        Ok(())
    }
}

impl SessionSource for JsonlSessionSource {
    fn schedule(&self, year: i32) -> Result<Vec<String>, LapTraceError> {
        let path = self.schedule_path(year);
        if !path.exists() {
            return Err(LapTraceError::ScheduleNotFound { year });
        }
        let file = File::open(&path).map_err(|e| LapTraceError::SessionLoadError { source: e })?;
        let entries: Vec<ScheduleEntry> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LapTraceError::SessionParseError {
                reason: format!("{:?}: {}", path, e),
            })?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_testing)
            .map(|e| e.name)
            .collect())
    }

    fn load(&self, id: &SessionId) -> Result<Session, LapTraceError> {
        let path = self.session_path(id);
        if !path.exists() {
            return Err(LapTraceError::SessionNotFound {
                path: format!("{:?}", path),
            });
        }

        let records = serde_jsonlines::json_lines(&path)
            .map_err(|e| LapTraceError::SessionLoadError { source: e })?
            .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
            .map_err(|e| LapTraceError::SessionLoadError { source: e })?;

        let mut info: Option<SessionInfo> = None;
        let mut laps = Vec::new();
        let mut telemetry = Vec::new();
        for record in records {
            match record {
                SessionRecord::Info(session_info) => {
                    if info.is_some() {
                        return Err(LapTraceError::SessionParseError {
                            reason: format!("{:?} has more than one session header", path),
                        });
                    }
                    info = Some(session_info);
                }
                SessionRecord::Lap(lap) => laps.push(lap),
                SessionRecord::Telemetry {
                    driver,
                    lap_number,
                    samples,
                } => telemetry.push((driver, lap_number, samples)),
            }
        }

        let info = info.unwrap_or_else(|| {
            warn!("{:?} has no session header, using {}", path, id);
            SessionInfo::new(&id.event, id.year, id.kind)
        });
        let mut session = Session::new(info);
        for lap in laps {
            session.add_lap(lap);
        }
        for (driver, lap_number, samples) in telemetry {
            if !session
                .laps()
                .iter()
                .any(|l| l.driver == driver && l.lap_number == lap_number)
            {
                warn!("Telemetry for {driver} lap {lap_number} has no matching lap record");
            }
            session.add_telemetry(&driver, lap_number, samples);
        }

        info!(
            "Loaded {}, found {} laps for {} drivers",
            id,
            session.laps().len(),
            session.drivers().len()
        );
        Ok(session)
    }
}
