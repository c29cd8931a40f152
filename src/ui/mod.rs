use egui::{Color32, RichText, Ui, Visuals, style::Widgets};
use egui_plot::{Legend, Line, PlotPoints};

use laptrace::charts::{ChartRequest, SeriesColor};

pub(crate) mod dashboard;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);

const CHART_HEIGHT: f32 = 280.;

pub(crate) fn default_visuals() -> Visuals {
    Visuals {
        dark_mode: true,
        hyperlink_color: PALETTE_MAROON,
        faint_bg_color: PALETTE_BLACK,
        extreme_bg_color: PALETTE_BROWN,
        panel_fill: PALETTE_BLACK,
        button_frame: true,
        window_fill: PALETTE_BLACK,
        widgets: Widgets::dark(),
        striped: false,
        ..Default::default()
    }
}

pub(crate) fn series_color(color: SeriesColor) -> Color32 {
    match color {
        SeriesColor::Blue => Color32::from_rgb(66, 133, 244),
        SeriesColor::Orange => PALETTE_ORANGE,
        SeriesColor::Green => Color32::GREEN,
        SeriesColor::Red => Color32::RED,
    }
}

pub(crate) fn show_chart(ui: &mut Ui, chart: &ChartRequest) {
    ui.label(RichText::new(&chart.title).color(Color32::WHITE).strong());
    egui_plot::Plot::new(chart.title.as_str())
        .show_background(false)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label(chart.y_label.as_str())
        .show(ui, |plot_ui| {
            for series in &chart.series {
                plot_ui.line(
                    Line::new(series.label.as_str(), PlotPoints::new(series.points.clone()))
                        .color(series_color(series.color)),
                );
            }
        });
}
