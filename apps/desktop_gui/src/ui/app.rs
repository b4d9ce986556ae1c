//! eframe application shell: form fields, soil-type selector, gated submit
//! button, result panel, and error banner.

use std::time::Duration;

use client_core::UiStatus;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{domain::FormInput, protocol::PredictionResult};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{status_line, UiEvent},
        orchestration::dispatch_backend_command,
    },
};

pub struct AdvisorApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    form: FormInput,
    soil_types: Vec<String>,
    status: UiStatus,
    status_note: String,
    startup_failure: Option<String>,
    catalog_requested: bool,
}

impl AdvisorApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            form: FormInput::default(),
            soil_types: Vec::new(),
            status: UiStatus::Idle,
            status_note: "Backend worker starting...".to_string(),
            startup_failure: None,
            catalog_requested: false,
        }
    }

    fn drain_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status_note = message,
                UiEvent::FatalStartup(message) => self.startup_failure = Some(message),
                UiEvent::CatalogLoaded { soil_types } => {
                    if self.form.soil_type.is_empty() {
                        if let Some(first) = soil_types.first() {
                            self.form.soil_type = first.clone();
                        }
                    }
                    self.soil_types = soil_types;
                    self.status_note = status_line(&self.status, self.soil_types.is_empty());
                }
                UiEvent::StatusChanged(status) => {
                    self.status = status;
                    self.status_note = status_line(&self.status, self.soil_types.is_empty());
                }
            }
        }
    }

    fn can_submit(&self) -> bool {
        !self.soil_types.is_empty() && !self.status.is_loading() && self.startup_failure.is_none()
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("soil_form")
            .num_columns(2)
            .spacing([16.0, 10.0])
            .show(ui, |ui| {
                ui.label("Nitrogen (N) value:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.nitrogen).hint_text("e.g. 37"),
                );
                ui.end_row();

                ui.label("Potassium (K) value:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.potassium).hint_text("e.g. 0"),
                );
                ui.end_row();

                ui.label("Phosphorous (P) value:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.phosphorous).hint_text("e.g. 0"),
                );
                ui.end_row();

                ui.label("Soil type:");
                let selected = if self.form.soil_type.is_empty() {
                    "Loading soil types...".to_string()
                } else {
                    self.form.soil_type.clone()
                };
                egui::ComboBox::from_label("")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for label in &self.soil_types {
                            ui.selectable_value(&mut self.form.soil_type, label.clone(), label);
                        }
                    });
                ui.end_row();

                ui.label("Location (for weather data):");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.location)
                        .hint_text("e.g. Bengaluru, India"),
                );
                ui.end_row();
            });

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            let label = if self.status.is_loading() {
                "Getting recommendations..."
            } else {
                "Get recommendations"
            };
            let submit = ui.add_enabled(self.can_submit(), egui::Button::new(label));
            if submit.clicked() {
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::Predict {
                        input: self.form.clone(),
                    },
                    &mut self.status_note,
                );
            }
            if self.status.is_loading() {
                ui.add(egui::Spinner::new());
            }
        });
    }

    fn render_outcome(&self, ui: &mut egui::Ui) {
        if let Some(message) = self.startup_failure.as_deref() {
            ui.add_space(12.0);
            ui.colored_label(ui.visuals().error_fg_color, message);
            return;
        }

        if let Some(message) = self.status.error_message() {
            ui.add_space(12.0);
            ui.colored_label(ui.visuals().error_fg_color, message);
        }

        if let Some(result) = self.status.result() {
            ui.add_space(12.0);
            self.render_result(ui, result);
        }
    }

    fn render_result(&self, ui: &mut egui::Ui, result: &PredictionResult) {
        ui.heading("Your personalized farm insights");
        ui.add_space(6.0);
        egui::Grid::new("weather_tiles")
            .num_columns(2)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                ui.label("Temperature:");
                ui.strong(format_celsius(result.temperature_c));
                ui.end_row();

                ui.label("Humidity:");
                ui.strong(format_percent(result.humidity_percent));
                ui.end_row();

                ui.label("Est. soil moisture:");
                ui.strong(format_percent(result.moisture_estimate));
                ui.end_row();
            });

        ui.add_space(8.0);
        ui.label("Predicted crop type:");
        ui.heading(result.predicted_crop_type.to_uppercase());
        ui.add_space(4.0);
        ui.label("Recommended fertilizer:");
        ui.heading(result.predicted_fertilizer_name.to_uppercase());
    }
}

impl eframe::App for AdvisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_ui_events();

        if !self.catalog_requested {
            self.catalog_requested = true;
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::LoadSoilTypes,
                &mut self.status_note,
            );
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status_note);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Smart Farming Assistant");
            ui.add_space(10.0);
            self.render_form(ui);
            self.render_outcome(ui);
        });

        // Backend events arrive from the worker thread; poll for them even
        // while the pointer is idle.
        ctx.request_repaint_after(Duration::from_millis(150));
    }
}

fn format_celsius(value: f64) -> String {
    format!("{value:.1}°C")
}

fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}
