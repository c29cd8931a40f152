// Chart requests handed to a renderer: a title plus labelled, coloured
// (x, y) series for each telemetry channel.

use serde::{Deserialize, Serialize};

use crate::analysis::{ComparisonReport, SpeedAdvantage};
use crate::telemetry::NormalizedSeries;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeriesColor {
    /// Driver 1
    Blue,
    /// Driver 2
    Orange,
    /// Driver 1 ahead
    Green,
    /// Driver 1 behind
    Red,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub color: SeriesColor,
    pub points: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChartRequest {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Speed,
    Throttle,
    Brake,
    DeltaTime,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Speed,
        Channel::Throttle,
        Channel::Brake,
        Channel::DeltaTime,
    ];

    fn title(&self) -> &'static str {
        match self {
            Channel::Speed => "SPEED",
            Channel::Throttle => "THROTTLE",
            Channel::Brake => "BRAKE",
            Channel::DeltaTime => "DELTA TIME",
        }
    }

    fn series_name(&self) -> &'static str {
        match self {
            Channel::Speed => "Speed",
            Channel::Throttle => "Throttle",
            Channel::Brake => "Brake",
            Channel::DeltaTime => "Delta",
        }
    }

    fn y_label(&self) -> &'static str {
        match self {
            Channel::Speed => "Speed (km/h)",
            Channel::Throttle => "Throttle (%)",
            Channel::Brake => "Brake",
            Channel::DeltaTime => "Delta (s)",
        }
    }
}

/// e.g. "ITALIAN GRAND PRIX 2023 - RACE - LAP 12 SPEED"
pub fn chart_title(report: &ComparisonReport, channel: Channel) -> String {
    format!(
        "{} {} - {} - {} {}",
        report.session.event_name.to_uppercase(),
        report.session.year,
        report.session.kind.to_string().to_uppercase(),
        report.selection.label(),
        channel.title()
    )
}

/// X coordinates: meters along driver 1's lap, or the raw position when
/// that lap had no usable distance
fn x_axis(report: &ComparisonReport) -> (Vec<f64>, &'static str) {
    let series = &report.result.series1;
    if series.lap_distance_m > 0. {
        (
            series
                .position
                .iter()
                .map(|p| p * series.lap_distance_m)
                .collect(),
            "Distance (m)",
        )
    } else {
        (series.position.clone(), "Lap position")
    }
}

fn zip_points(x: &[f64], y: &[f64]) -> Vec<[f64; 2]> {
    x.iter().zip(y).map(|(x, y)| [*x, *y]).collect()
}

fn masked_points(x: &[f64], y: &[f64], mask: &[bool]) -> Vec<[f64; 2]> {
    x.iter()
        .zip(y)
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .map(|((x, y), _)| [*x, *y])
        .collect()
}

pub fn build_chart(report: &ComparisonReport, channel: Channel) -> ChartRequest {
    let result = &report.result;
    let (x, x_label) = x_axis(report);

    let series = match channel {
        Channel::DeltaTime => vec![
            ChartSeries {
                label: "Gain".to_string(),
                color: SeriesColor::Green,
                points: masked_points(&x, &result.delta_time, &result.gain_mask),
            },
            ChartSeries {
                label: "Loss".to_string(),
                color: SeriesColor::Red,
                points: masked_points(&x, &result.delta_time, &result.loss_mask),
            },
        ],
        _ => {
            let values = |s: &NormalizedSeries| -> Vec<f64> {
                match channel {
                    Channel::Speed => s.speed.clone(),
                    Channel::Throttle => s.throttle.clone(),
                    _ => s.brake.clone(),
                }
            };
            vec![
                ChartSeries {
                    label: format!("{} {}", result.driver1, channel.series_name()),
                    color: SeriesColor::Blue,
                    points: zip_points(&x, &values(&result.series1)),
                },
                ChartSeries {
                    label: format!("{} {}", result.driver2, channel.series_name()),
                    color: SeriesColor::Orange,
                    points: zip_points(&x, &values(&result.series2)),
                },
            ]
        }
    };

    ChartRequest {
        title: chart_title(report, channel),
        x_label: x_label.to_string(),
        y_label: channel.y_label().to_string(),
        series,
    }
}

/// Speed, throttle, brake and delta charts, in that order
pub fn build_charts(report: &ComparisonReport) -> Vec<ChartRequest> {
    Channel::ALL
        .iter()
        .map(|channel| build_chart(report, *channel))
        .collect()
}

fn advantage_line(zone: &str, advantage: &SpeedAdvantage) -> String {
    match &advantage.driver {
        Some(driver) => format!(
            "{zone}: {driver} faster by {:.2} km/h on average",
            advantage.magnitude_kph
        ),
        None => format!("{zone}: no speed advantage"),
    }
}

/// Text block summarising where each driver is quicker
pub fn summary_lines(report: &ComparisonReport) -> Vec<String> {
    let result = &report.result;
    let mut lines = vec![
        advantage_line("Straights", &result.straight_advantage),
        advantage_line("Corners", &result.corner_advantage),
    ];
    match result.final_delta() {
        Some(delta) if delta < 0. => lines.push(format!(
            "Finish: {} ahead by {:.3} s",
            result.driver1, -delta
        )),
        Some(delta) if delta > 0. => lines.push(format!(
            "Finish: {} ahead by {:.3} s",
            result.driver2, delta
        )),
        Some(_) => lines.push("Finish: dead heat".to_string()),
        None => lines.push("Finish: no data".to_string()),
    }
    lines
}
