mod ui;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use egui::Vec2;
use log::{error, info};

use laptrace::{
    AppConfig, ComparisonRequest, JsonlSessionSource, LapSelection, LapTraceError, SessionId,
    SessionKind, SessionSource, build_charts, compare_in_session, summary_lines,
    writer::write_charts,
};
use ui::dashboard::DashboardApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Session cache directory, overrides the configured one
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
#[group(required = false, multiple = false)]
struct LapMode {
    /// Compare this lap number
    #[arg(short, long)]
    lap: Option<u32>,
    /// Compare each driver's fastest lap
    #[arg(long)]
    fastest: bool,
    /// Compare the average of each driver's race pace laps
    #[arg(long)]
    race_pace: bool,
}

impl LapMode {
    fn selection(&self, default_lap: u32) -> LapSelection {
        if self.fastest {
            LapSelection::Fastest
        } else if self.race_pace {
            LapSelection::RacePace
        } else {
            LapSelection::Single(self.lap.unwrap_or(default_lap))
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the comparison dashboard
    Dashboard,
    /// List the events of a season
    Schedule {
        #[arg(short, long)]
        year: i32,
    },
    /// Compare two drivers and print where each one is faster
    Compare {
        #[arg(short, long)]
        year: i32,
        #[arg(short, long)]
        event: String,
        #[arg(short, long, default_value = "race")]
        session: SessionKind,
        #[arg(long)]
        driver1: String,
        #[arg(long)]
        driver2: String,
        #[command(flatten)]
        mode: LapMode,
        /// Write the chart series to this file as JSON lines
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn session_source(config: &AppConfig) -> Result<JsonlSessionSource, LapTraceError> {
    Ok(JsonlSessionSource::new(config.data_dir()?))
}

fn dashboard(config: AppConfig) -> Result<(), LapTraceError> {
    let source = session_source(&config)?;
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(1200., 900.));

    eframe::run_native(
        "Laptrace",
        native_options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(config, source, cc)))),
    )
    .map_err(|e| LapTraceError::DashboardError {
        reason: e.to_string(),
    })
}

fn schedule(config: &AppConfig, year: i32) -> Result<(), LapTraceError> {
    let source = session_source(config)?;
    for (round, event) in source.schedule(year)?.iter().enumerate() {
        println!("{:>2}  {}", round + 1, event);
    }
    Ok(())
}

fn compare(
    config: &AppConfig,
    id: &SessionId,
    request: &ComparisonRequest,
    output: Option<&PathBuf>,
) -> Result<(), LapTraceError> {
    let source = session_source(config)?;
    let params = config.analysis_params()?;
    let report = compare_in_session(&source, id, request, &params)?;

    println!(
        "{} vs {} - {} - {}",
        request.driver1,
        request.driver2,
        id,
        request.selection.label()
    );
    println!(
        "Laps used: {} {:?}, {} {:?}",
        request.driver1, report.laps_used1, request.driver2, report.laps_used2
    );
    for line in summary_lines(&report) {
        println!("{line}");
    }

    if let Some(output_file) = output {
        write_charts(output_file, &build_charts(&report))?;
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        error!("Could not read config, using defaults: {e}");
        AppConfig::default()
    });
    if let Some(data_dir) = cli.data_dir {
        info!("Reading sessions from {:?}", data_dir);
        config.data_dir = Some(data_dir);
    }

    let result = match cli.command {
        Commands::Dashboard => dashboard(config),
        Commands::Schedule { year } => schedule(&config, year),
        Commands::Compare {
            year,
            event,
            session,
            driver1,
            driver2,
            mode,
            output,
        } => {
            let id = SessionId::new(year, &event, session);
            let request =
                ComparisonRequest::new(&driver1, &driver2, mode.selection(config.default_lap));
            compare(&config, &id, &request, output.as_ref())
        }
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
