// Library interface for laptrace
// This allows integration tests and benches to access internal modules

pub mod analysis;
pub mod charts;
pub mod config;
pub mod errors;
pub mod session;
pub mod telemetry;
pub mod writer;

// Re-export commonly used types
pub use analysis::{
    AnalysisParams, ComparisonReport, ComparisonRequest, ComparisonResult, LapSelection,
    compare_drivers, compare_in_session,
};
pub use charts::{ChartRequest, build_charts, summary_lines};
pub use config::AppConfig;
pub use errors::LapTraceError;
pub use session::{
    JsonlSessionSource, MemorySessionSource, Session, SessionId, SessionInfo, SessionKind,
    SessionSource,
};
pub use telemetry::{NormalizedSeries, RawLap, TelemetrySample};
