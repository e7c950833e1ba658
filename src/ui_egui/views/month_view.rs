use chrono::{Datelike, Local, NaiveDate};
use chrono_tz::Tz;
use egui::{Align2, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use super::palette::{with_alpha, TimelinePalette};
use crate::models::occurrence::EventOccurrence;
use crate::timeline::week_band::layout_week_band;

const DAY_NUMBER_HEIGHT: f32 = 18.0;
const BAR_HEIGHT: f32 = 16.0;

/// Result returned from month view
#[derive(Default)]
pub struct MonthViewResult {
    pub action: MonthViewAction,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub enum MonthViewAction {
    #[default]
    None,
    /// Open the day on the time grid
    SwitchToDay(NaiveDate),
    EventTapped(String),
}

pub struct MonthView;

impl MonthView {
    /// Paint a six-week grid. `days` must be whole weeks.
    pub fn show(
        ui: &mut egui::Ui,
        days: &[NaiveDate],
        selected: NaiveDate,
        occurrences: &[EventOccurrence],
        max_rows: usize,
        tz: Tz,
    ) -> MonthViewResult {
        let mut result = MonthViewResult::default();
        if days.is_empty() {
            return result;
        }

        let palette = TimelinePalette::from_visuals(ui.visuals());
        let today = Local::now().date_naive();
        let area = ui.available_rect_before_wrap();
        ui.allocate_rect(area, Sense::hover());

        let week_count = days.len().div_ceil(7);
        let cell = Vec2::new(area.width() / 7.0, area.height() / week_count as f32);
        let painter = ui.painter_at(area);
        painter.rect_filled(area, 0.0, palette.background);

        for (week_index, week) in days.chunks(7).enumerate() {
            let row_top = area.top() + week_index as f32 * cell.y;

            for (column, day) in week.iter().enumerate() {
                let rect = Rect::from_min_size(
                    Pos2::new(area.left() + column as f32 * cell.x, row_top),
                    cell,
                );
                if *day == today {
                    painter.rect_filled(rect, 0.0, palette.today_bg);
                }
                painter.rect_stroke(rect, 0.0, Stroke::new(1.0, palette.column_border));

                let label_color = if day.month() == selected.month() {
                    palette.label
                } else {
                    with_alpha(palette.label, 90)
                };
                painter.text(
                    rect.min + Vec2::new(4.0, 2.0),
                    Align2::LEFT_TOP,
                    day.day().to_string(),
                    FontId::proportional(12.0),
                    label_color,
                );

                let response =
                    ui.interact(rect, ui.id().with(("month_cell", *day)), Sense::click());
                if response.double_clicked() {
                    result.action = MonthViewAction::SwitchToDay(*day);
                }
            }

            let band = layout_week_band(occurrences, week, max_rows, tz);
            for block in &band.blocks {
                let bar = Rect::from_min_size(
                    Pos2::new(
                        area.left() + block.start_column as f32 * cell.x + 2.0,
                        row_top + DAY_NUMBER_HEIGHT + block.row as f32 * (BAR_HEIGHT + 2.0),
                    ),
                    Vec2::new(block.span() as f32 * cell.x - 4.0, BAR_HEIGHT),
                );
                if bar.bottom() > row_top + cell.y {
                    continue;
                }
                painter.rect_filled(bar, 3.0, palette.block_fill(&block.occurrence.color));
                painter.text(
                    bar.left_center() + Vec2::new(4.0, 0.0),
                    Align2::LEFT_CENTER,
                    &block.occurrence.title,
                    FontId::proportional(11.0),
                    palette.block_text,
                );

                let id = ui.id().with(("month_bar", &block.occurrence.id, week_index));
                if ui.interact(bar, id, Sense::click()).clicked() {
                    result.action = MonthViewAction::EventTapped(block.occurrence.id.clone());
                }
            }

            for (column, count) in band.overflow_per_day.iter().enumerate() {
                if *count == 0 {
                    continue;
                }
                painter.text(
                    Pos2::new(
                        area.left() + column as f32 * cell.x + 4.0,
                        row_top + DAY_NUMBER_HEIGHT + band.row_count as f32 * (BAR_HEIGHT + 2.0),
                    ),
                    Align2::LEFT_TOP,
                    format!("+{}", count),
                    FontId::proportional(11.0),
                    palette.overflow_text,
                );
            }
        }

        result
    }
}
