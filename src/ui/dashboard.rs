use egui::{Color32, Frame, Layout, Margin, RichText, Ui};
use log::{error, info};

use laptrace::{
    AppConfig, ChartRequest, ComparisonReport, ComparisonRequest, JsonlSessionSource,
    LapSelection, LapTraceError, Session, SessionId, SessionKind, SessionSource, build_charts,
    compare_drivers, summary_lines,
};

use super::{default_visuals, show_chart};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SelectionMode {
    SingleLap,
    FastestLap,
    RacePace,
}

impl SelectionMode {
    fn description(&self) -> &'static str {
        match self {
            SelectionMode::SingleLap => "Single lap",
            SelectionMode::FastestLap => "Fastest lap",
            SelectionMode::RacePace => "Race pace",
        }
    }
}

/// What the central panel shows
enum UiState {
    Idle,
    Error { message: String },
    Display {
        charts: Vec<ChartRequest>,
        summary: Vec<String>,
    },
}

pub(crate) struct DashboardApp {
    config: AppConfig,
    source: JsonlSessionSource,
    ui_state: UiState,

    selected_year: i32,
    schedule_year: Option<i32>,
    events: Vec<String>,
    selected_event: String,
    session_kind: SessionKind,

    session: Option<Session>,
    drivers: Vec<String>,
    driver1: String,
    driver2: String,
    mode: SelectionMode,
    lap_number: u32,
}

impl DashboardApp {
    pub(crate) fn new(
        config: AppConfig,
        source: JsonlSessionSource,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        cc.egui_ctx.set_visuals(default_visuals());
        Self {
            selected_year: config.last_year,
            lap_number: config.default_lap,
            config,
            source,
            ui_state: UiState::Idle,
            schedule_year: None,
            events: Vec::new(),
            selected_event: String::new(),
            session_kind: SessionKind::Race,
            session: None,
            drivers: Vec::new(),
            driver1: String::new(),
            driver2: String::new(),
            mode: SelectionMode::SingleLap,
        }
    }

    fn show_error(&mut self, err: LapTraceError) {
        error!("{err}");
        self.ui_state = UiState::Error {
            message: err.to_string(),
        };
    }

    fn refresh_schedule(&mut self) {
        if self.schedule_year == Some(self.selected_year) {
            return;
        }
        self.schedule_year = Some(self.selected_year);
        match self.source.schedule(self.selected_year) {
            Ok(events) => {
                if !events.contains(&self.selected_event) {
                    self.selected_event = events.first().cloned().unwrap_or_default();
                }
                self.events = events;
            }
            Err(e) => {
                self.events.clear();
                self.selected_event.clear();
                self.show_error(e);
            }
        }
    }

    fn load_session(&mut self) {
        let id = SessionId::new(self.selected_year, &self.selected_event, self.session_kind);
        match self.source.load(&id) {
            Ok(session) => {
                info!("{id} loaded");
                self.drivers = session.drivers();
                self.driver1 = self.drivers.first().cloned().unwrap_or_default();
                self.driver2 = self.drivers.get(1).cloned().unwrap_or_default();
                self.session = Some(session);
                self.ui_state = UiState::Idle;
            }
            Err(e) => {
                self.session = None;
                self.drivers.clear();
                self.show_error(e);
            }
        }
    }

    fn selection(&self) -> LapSelection {
        match self.mode {
            SelectionMode::SingleLap => LapSelection::Single(self.lap_number),
            SelectionMode::FastestLap => LapSelection::Fastest,
            SelectionMode::RacePace => LapSelection::RacePace,
        }
    }

    fn run_comparison(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let request = ComparisonRequest::new(&self.driver1, &self.driver2, self.selection());
        let report: Result<ComparisonReport, LapTraceError> = self
            .config
            .analysis_params()
            .and_then(|params| compare_drivers(session, &request, &params));
        match report {
            Ok(report) => {
                self.ui_state = UiState::Display {
                    charts: build_charts(&report),
                    summary: summary_lines(&report),
                }
            }
            Err(e) => self.show_error(e),
        }
    }

    fn pick_data_dir(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(self.source.root())
            .pick_folder()
        {
            info!("Using session data in {:?}", dir);
            self.config.data_dir = Some(dir.clone());
            if let Err(e) = self.config.save() {
                self.show_error(e);
            }
            self.source = JsonlSessionSource::new(dir);
            self.schedule_year = None;
            self.session = None;
            self.drivers.clear();
        }
    }

    fn show_session_selectors(&mut self, ui: &mut Ui) {
        let years = self.config.years();
        let mut load_clicked = false;
        let mut pick_dir_clicked = false;

        ui.with_layout(Layout::left_to_right(egui::Align::Center), |ui| {
            ui.label(RichText::new("Year: ").color(Color32::WHITE));
            egui::ComboBox::from_id_salt("year_combo")
                .selected_text(self.selected_year.to_string())
                .show_ui(ui, |ui| {
                    for year in &years {
                        ui.selectable_value(&mut self.selected_year, *year, year.to_string());
                    }
                });
            ui.separator();
            ui.label(RichText::new("Grand Prix: ").color(Color32::WHITE));
            egui::ComboBox::from_id_salt("event_combo")
                .selected_text(self.selected_event.as_str())
                .width(240.)
                .show_ui(ui, |ui| {
                    for event in &self.events {
                        ui.selectable_value(&mut self.selected_event, event.clone(), event.as_str());
                    }
                });
            ui.separator();
            egui::ComboBox::from_id_salt("session_combo")
                .selected_text(self.session_kind.to_string())
                .show_ui(ui, |ui| {
                    for kind in SessionKind::ALL {
                        ui.selectable_value(&mut self.session_kind, kind, kind.to_string());
                    }
                });
            load_clicked = ui
                .add_enabled(!self.selected_event.is_empty(), egui::Button::new("Load Session"))
                .clicked();
            ui.separator();
            pick_dir_clicked = ui.button("Data folder…").clicked();
        });

        if pick_dir_clicked {
            self.pick_data_dir();
        }
        if load_clicked {
            self.load_session();
        }
    }

    fn show_comparison_selectors(&mut self, ui: &mut Ui) {
        let Some(session) = &self.session else {
            return;
        };
        let loaded = format!(
            "{} {} {} loaded",
            session.info().event_name,
            session.info().year,
            session.info().kind
        );
        let mut compare_clicked = false;

        ui.with_layout(Layout::left_to_right(egui::Align::Center), |ui| {
            ui.label(RichText::new(loaded).color(Color32::LIGHT_GREEN));
            ui.separator();
            for (id, label, driver) in [
                ("driver1_combo", "Driver 1: ", &mut self.driver1),
                ("driver2_combo", "Driver 2: ", &mut self.driver2),
            ] {
                ui.label(RichText::new(label).color(Color32::WHITE));
                egui::ComboBox::from_id_salt(id)
                    .selected_text(driver.as_str())
                    .show_ui(ui, |ui| {
                        for code in &self.drivers {
                            ui.selectable_value(driver, code.clone(), code.as_str());
                        }
                    });
            }
            ui.separator();
            egui::ComboBox::from_id_salt("mode_combo")
                .selected_text(self.mode.description())
                .show_ui(ui, |ui| {
                    for mode in [
                        SelectionMode::SingleLap,
                        SelectionMode::FastestLap,
                        SelectionMode::RacePace,
                    ] {
                        ui.selectable_value(&mut self.mode, mode, mode.description());
                    }
                });
            if self.mode == SelectionMode::SingleLap {
                ui.label(RichText::new("Lap Number: ").color(Color32::WHITE));
                ui.add(egui::DragValue::new(&mut self.lap_number).range(1..=100));
            }
            compare_clicked = ui.button("View Telemetry Data").clicked();
        });

        if compare_clicked {
            self.run_comparison();
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_schedule();

        egui::TopBottomPanel::top("SessionSelector")
            .frame(
                Frame::default()
                    .fill(Color32::TRANSPARENT)
                    .inner_margin(Margin::same(5)),
            )
            .show(ctx, |ui| {
                self.show_session_selectors(ui);
                self.show_comparison_selectors(ui);
            });

        egui::CentralPanel::default()
            .frame(
                Frame::default()
                    .fill(Color32::TRANSPARENT)
                    .inner_margin(Margin::same(5)),
            )
            .show(ctx, |ui| match &self.ui_state {
                UiState::Idle => {
                    ui.label(
                        RichText::new("Pick a session and two drivers to compare")
                            .color(Color32::WHITE),
                    );
                }
                UiState::Error { message } => {
                    ui.heading(RichText::new(message).color(Color32::RED).strong());
                }
                UiState::Display { charts, summary } => {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for line in summary {
                            ui.label(RichText::new(line).color(Color32::WHITE).monospace());
                        }
                        ui.separator();
                        for chart in charts {
                            show_chart(ui, chart);
                            ui.add_space(10.);
                        }
                    });
                }
            });
    }
}
