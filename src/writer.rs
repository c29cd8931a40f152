use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use log::info;
use serde_jsonlines::JsonLinesWriter;

use crate::{LapTraceError, charts::ChartRequest};

/// Write one chart request per line
pub fn write_charts(file: &Path, charts: &[ChartRequest]) -> Result<(), LapTraceError> {
    let chart_file = File::create(file).map_err(|e| LapTraceError::WriterError { source: e })?;
    let mut chart_writer = JsonLinesWriter::new(BufWriter::new(chart_file));
    for chart in charts {
        chart_writer
            .write(chart)
            .map_err(|e| LapTraceError::WriterError { source: e })?;
    }
    chart_writer
        .flush()
        .map_err(|e| LapTraceError::WriterError { source: e })?;
    info!("Wrote {} charts to {:?}", charts.len(), file);
    Ok(())
}
