//! Recommendation assistant window — egui/eframe application.
//!
//! [`AssistantApp`] is a thin shell over [`UiController`]: every frame it
//! polls the controller, forwards clicks and key presses to it, and draws
//! whatever the controller reports.
//!
//! # Layout
//!
//! | Row | Content |
//! |-----|---------|
//! | 1 | Query field · mic button · submit button |
//! | 2 | Result area (blank / spinner / text / ⚠️ error) · copy button |
//!
//! An unsupported-dictation notice is drawn as a centered window that
//! blocks the rest of the UI until dismissed.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::clipboard::FeedbackState;
use crate::controller::UiController;
use crate::dictation::MicAffordance;
use crate::render::{Presentation, IN_PROGRESS_TEXT, WARNING_MARKER};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);
const LISTENING_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 68, 68);
const CONFIRMED_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);

/// eframe application.
pub struct AssistantApp {
    controller: UiController,
}

impl AssistantApp {
    pub fn new(controller: UiController) -> Self {
        Self { controller }
    }

    // ── Rows ─────────────────────────────────────────────────────────────

    fn draw_query_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let field_width = (ui.available_width() - 90.0).max(120.0);
            let field = ui.add(
                egui::TextEdit::singleline(self.controller.input_mut().text_mut())
                    .hint_text("Describe what you are looking for…")
                    .desired_width(field_width),
            );
            let enter_pressed =
                field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let (mic_label, mic_color) = match self.controller.mic_affordance() {
                MicAffordance::Default => ("🎤", ui.visuals().text_color()),
                MicAffordance::Listening => ("🔴", LISTENING_COLOR),
            };
            let mic = ui
                .add(egui::Button::new(egui::RichText::new(mic_label).color(mic_color)))
                .on_hover_text("Dictate query");
            if mic.clicked() {
                // Errors are logged and surfaced by the controller.
                let _ = self.controller.activate_dictation();
            }

            let submit = ui.add_enabled(
                self.controller.trigger_enabled(),
                egui::Button::new("Submit"),
            );
            if submit.clicked() || (enter_pressed && self.controller.trigger_enabled()) {
                if let Err(e) = self.controller.submit() {
                    log::debug!("submit rejected: {e}");
                }
            }
        });
    }

    fn draw_result_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_top(|ui| {
            let copy_width = 32.0;
            let text_width = (ui.available_width() - copy_width).max(120.0);

            ui.allocate_ui(egui::vec2(text_width, 0.0), |ui| {
                match self.controller.presentation() {
                    Presentation::Blank => {}
                    Presentation::InProgress => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(IN_PROGRESS_TEXT);
                        });
                    }
                    Presentation::Success(text) => {
                        ui.add(egui::Label::new(text.as_str()).wrap());
                    }
                    Presentation::Error(text) => {
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(format!("{WARNING_MARKER}{text}"))
                                    .color(ERROR_COLOR),
                            )
                            .wrap(),
                        );
                    }
                }
            });

            let (icon, color) = match self.controller.feedback_state() {
                FeedbackState::Neutral => ("📋", ui.visuals().text_color()),
                FeedbackState::Confirmed => ("✔", CONFIRMED_COLOR),
            };
            let copy = ui
                .add(egui::Button::new(egui::RichText::new(icon).color(color)).frame(false))
                .on_hover_text("Copy result");
            if copy.clicked() {
                self.controller.copy_current_result();
            }
        });
    }

    fn draw_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.notice().map(str::to_owned) else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Dictation unavailable")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.controller.dismiss_notice();
        }
    }

    /// Next frame deadline while something is pending.
    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        if self.controller.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else if let Some(deadline) = self.controller.feedback_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl eframe::App for AssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.controller.poll(now);
        self.schedule_repaint(ctx, now);

        let blocked = self.controller.notice().is_some();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                self.draw_query_row(ui);
                ui.separator();
                self.draw_result_row(ui);
            });
        });

        self.draw_notice(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("recommendation assistant closing");
    }
}
