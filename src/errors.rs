// Error types for laptrace

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum LapTraceError {
    // Lap selection errors
    #[snafu(display("No lap {lap_number} recorded for driver {driver}"))]
    LapNotFound { driver: String, lap_number: u32 },
    #[snafu(display("Driver {driver} has no timed laps in this session"))]
    NoTimedLaps { driver: String },
    #[snafu(display("Driver {driver} did not take part in this session"))]
    UnknownDriver { driver: String },

    // Session source errors
    #[snafu(display("No schedule available for {year}"))]
    ScheduleNotFound { year: i32 },
    #[snafu(display("Event {event} is not part of the {year} schedule"))]
    EventNotFound { year: i32, event: String },
    #[snafu(display("No session data found at {path}"))]
    SessionNotFound { path: String },
    #[snafu(display("Error loading session data"))]
    SessionLoadError { source: io::Error },
    #[snafu(display("Malformed session data: {reason}"))]
    SessionParseError { reason: String },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Could not find application data directory"))]
    NoDataDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Output errors
    #[snafu(display("Error writing chart export"))]
    WriterError { source: io::Error },
    #[snafu(display("Dashboard failed: {reason}"))]
    DashboardError { reason: String },
}
