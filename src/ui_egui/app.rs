mod navigation;

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use egui::RichText;

use super::views::list_view::ListView;
use super::views::month_view::{MonthView, MonthViewAction};
use super::views::timeline_view::TimelineView;
use crate::models::date_range::DateRange;
use crate::models::settings::TimelineSettings;
use crate::models::ui::ViewType;
use crate::services::bridge::CalendarBridge;
use crate::timeline::{HapticFeedback, TimelineController, TimelineSignal};

pub struct TimelineApp {
    controller: TimelineController,
    current_view: ViewType,
    current_date: NaiveDate,
    /// Range the repository currently holds
    loaded_range: Option<DateRange>,
    status: Option<String>,
}

impl TimelineApp {
    pub fn new(settings: TimelineSettings, bridge: Arc<dyn CalendarBridge>) -> Self {
        let current_view = settings.default_view;
        let mut app = Self {
            controller: TimelineController::new(settings, bridge),
            current_view,
            current_date: Local::now().date_naive(),
            loaded_range: None,
            status: None,
        };
        app.sync_range();
        app.controller.scroll_to(app.controller.grid().minutes_to_pixels(7.0 * 60.0));
        app
    }

    /// Point the controller at the days the current view shows, fetching
    /// when they fall outside what is loaded.
    fn sync_range(&mut self) {
        let first_day = self.controller.settings().first_day_of_week;
        let tz = self.controller.grid().time_zone;
        let visible = self.current_view.visible_days(self.current_date, first_day);

        if self.current_view.timeline_columns().is_some() {
            self.controller.set_days(visible.clone());
        }

        let covered = self.loaded_range.as_ref().is_some_and(|range| {
            visible
                .first()
                .zip(visible.last())
                .is_some_and(|(first, last)| range.contains_day(*first) && range.contains_day(*last))
        });
        if covered {
            return;
        }

        let range = self.current_view.fetch_range(self.current_date, first_day, tz);
        match self.controller.load(&range) {
            Ok(count) => {
                self.status = Some(format!("{} events loaded", count));
                self.loaded_range = Some(range);
            }
            Err(e) => {
                log::error!("Failed to load events: {:#}", e);
                self.status = Some(format!("Could not load events: {}", e));
                self.loaded_range = None;
            }
        }
    }

    fn handle_signals(&mut self) {
        for signal in self.controller.drain_signals() {
            match signal {
                TimelineSignal::Haptic(HapticFeedback::Medium) => {
                    log::trace!("Haptic: session start");
                }
                TimelineSignal::Haptic(HapticFeedback::Light) => {
                    log::trace!("Haptic: snap tick");
                }
                TimelineSignal::EventTapped { occurrence_id } => {
                    let title = self
                        .controller
                        .repository()
                        .get(&occurrence_id)
                        .map(|occurrence| occurrence.title.clone())
                        .unwrap_or(occurrence_id);
                    self.status = Some(format!("Selected \"{}\"", title));
                }
                TimelineSignal::CreateRequested(request) => {
                    let tz = request.time_zone;
                    self.status = Some(format!(
                        "New event requested {} {}-{}",
                        request.day,
                        request.start.with_timezone(&tz).format("%H:%M"),
                        request.end.with_timezone(&tz).format("%H:%M")
                    ));
                }
                TimelineSignal::CommitSucceeded { occurrence_id } => {
                    log::debug!("Move of {} saved", occurrence_id);
                }
                TimelineSignal::CommitRolledBack {
                    occurrence_id,
                    error,
                } => {
                    log::error!("Move of {} rolled back: {}", occurrence_id, error);
                    self.status = Some(format!("Move could not be saved: {}", error));
                }
            }
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("◀").on_hover_text("Previous").clicked() {
                self.navigate_previous();
            }
            if ui.button("Today").clicked() {
                self.jump_to_today();
            }
            if ui.button("▶").on_hover_text("Next").clicked() {
                self.navigate_next();
            }

            ui.heading(self.title());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                for view in ViewType::ALL.iter().rev() {
                    if ui
                        .selectable_label(self.current_view == *view, view.label())
                        .clicked()
                    {
                        self.switch_view(*view);
                    }
                }
            });
        });
    }

    fn title(&self) -> String {
        match self.current_view {
            ViewType::Month | ViewType::List => self.current_date.format("%B %Y").to_string(),
            _ => {
                let days = self.controller.days();
                match (days.first(), days.last()) {
                    (Some(first), Some(last)) if first != last => {
                        format!("{} - {}", first.format("%b %-d"), last.format("%b %-d, %Y"))
                    }
                    (Some(first), _) => first.format("%A, %B %-d, %Y").to_string(),
                    _ => String::new(),
                }
            }
        }
    }

    fn render_view(&mut self, ui: &mut egui::Ui) {
        let tz = self.controller.grid().time_zone;
        match self.current_view {
            ViewType::Week | ViewType::ThreeDays | ViewType::Day => {
                let result = TimelineView::show(ui, &mut self.controller);
                if let Some(day) = result.clicked_day {
                    self.current_date = day;
                    self.switch_view(ViewType::Day);
                }
            }
            ViewType::Month => {
                let first_day = self.controller.settings().first_day_of_week;
                let max_rows = self.controller.settings().week_band_max_rows;
                let days = self.current_view.visible_days(self.current_date, first_day);
                let result = MonthView::show(
                    ui,
                    &days,
                    self.current_date,
                    self.controller.occurrences(),
                    max_rows,
                    tz,
                );
                match result.action {
                    MonthViewAction::None => {}
                    MonthViewAction::SwitchToDay(day) => {
                        self.current_date = day;
                        self.switch_view(ViewType::Day);
                    }
                    MonthViewAction::EventTapped(id) => self.show_occurrence(&id),
                }
            }
            ViewType::List => {
                if let Some(id) = ListView::show(ui, self.controller.occurrences(), tz) {
                    self.show_occurrence(&id);
                }
            }
        }
    }

    fn show_occurrence(&mut self, id: &str) {
        if let Some(occurrence) = self.controller.repository().get(id) {
            self.status = Some(format!("Selected \"{}\"", occurrence.title));
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.render_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(RichText::new(status).small());
                }
                let pending = self.controller.pending_commits();
                if pending > 0 {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.spinner();
                        ui.label(RichText::new(format!("Saving {}", pending)).small());
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_view(ui);
        });

        // The time grid ticks itself; other views still need commit results
        if self.current_view.timeline_columns().is_none() {
            self.controller.tick(Instant::now());
            if self.controller.pending_commits() > 0 {
                ctx.request_repaint();
            }
        }

        self.handle_signals();
    }
}
