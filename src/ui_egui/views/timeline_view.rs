//! Painted time grid for the week, three-day and day views.
//!
//! Layout, gestures and scrolling all live in [`TimelineController`]; this
//! view only maps egui input into controller pointer events and paints what
//! the controller publishes.

use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate};
use egui::{Align2, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use super::palette::{with_alpha, TimelinePalette};
use crate::timeline::{PointerEvent, TimelineController};

pub const TIME_LABEL_WIDTH: f32 = 52.0;
const HEADER_HEIGHT: f32 = 28.0;
const BAND_ROW_HEIGHT: f32 = 20.0;

#[derive(Default)]
pub struct TimelineViewResult {
    pub clicked_day: Option<NaiveDate>,
}

pub struct TimelineView;

impl TimelineView {
    pub fn show(ui: &mut egui::Ui, controller: &mut TimelineController) -> TimelineViewResult {
        let mut result = TimelineViewResult::default();
        let palette = TimelinePalette::from_visuals(ui.visuals());
        let days = controller.days().to_vec();
        if days.is_empty() {
            return result;
        }

        let full = ui.available_rect_before_wrap();
        let column_width = ((full.width() - TIME_LABEL_WIDTH) / days.len() as f32).max(1.0);
        controller.set_column_width(column_width);

        let header = Rect::from_min_size(full.min, Vec2::new(full.width(), HEADER_HEIGHT));
        if let Some(day) = Self::draw_header(ui, header, &days, column_width, &palette) {
            result.clicked_day = Some(day);
        }

        let band_top = header.bottom();
        let band_height = Self::draw_week_band(ui, controller, band_top, full, column_width, &palette);

        let viewport = Rect::from_min_max(
            Pos2::new(full.left(), band_top + band_height),
            full.max,
        );
        ui.allocate_rect(full, Sense::hover());
        let grid_rect = Rect::from_min_max(
            Pos2::new(viewport.left() + TIME_LABEL_WIDTH, viewport.top()),
            viewport.max,
        );
        controller.set_viewport_height(viewport.height());

        let response = ui.interact(grid_rect, ui.id().with("timeline_grid"), Sense::click_and_drag());
        Self::feed_input(ui, controller, grid_rect, &response);

        let painter = ui.painter_at(viewport);
        let offset = controller.frame().scroll_offset;
        let grid = *controller.grid();
        let to_screen_y = |content_y: f32| viewport.top() + content_y - offset;

        painter.rect_filled(viewport, 0.0, palette.background);

        let today = Local::now().date_naive();
        for (column, day) in days.iter().enumerate() {
            if *day == today {
                let x = grid_rect.left() + column as f32 * column_width;
                painter.rect_filled(
                    Rect::from_min_max(
                        Pos2::new(x, viewport.top()),
                        Pos2::new(x + column_width, viewport.bottom()),
                    ),
                    0.0,
                    palette.today_bg,
                );
            }
        }

        for quarter in 0..(24 * 4) {
            let y = to_screen_y(grid.minutes_to_pixels(quarter as f32 * 15.0));
            if y < viewport.top() - 1.0 || y > viewport.bottom() + 1.0 {
                continue;
            }
            let on_hour = quarter % 4 == 0;
            let color = if on_hour {
                palette.hour_line
            } else {
                palette.quarter_line
            };
            painter.line_segment(
                [Pos2::new(grid_rect.left(), y), Pos2::new(grid_rect.right(), y)],
                Stroke::new(1.0, color),
            );
            if on_hour && quarter > 0 {
                painter.text(
                    Pos2::new(viewport.left() + TIME_LABEL_WIDTH - 6.0, y),
                    Align2::RIGHT_CENTER,
                    format!("{:02}:00", quarter / 4),
                    FontId::proportional(11.0),
                    palette.label,
                );
            }
        }

        for column in 0..=days.len() {
            let x = grid_rect.left() + column as f32 * column_width;
            painter.line_segment(
                [Pos2::new(x, viewport.top()), Pos2::new(x, viewport.bottom())],
                Stroke::new(1.0, palette.column_border),
            );
        }

        let frame = controller.frame().clone();
        let dragged = frame.dragged_id().map(str::to_string);
        let content_origin = Pos2::new(grid_rect.left(), viewport.top() - offset);

        for block in controller.blocks() {
            let rect = block.rect(column_width).translate(content_origin.to_vec2());
            if !rect.intersects(viewport) {
                continue;
            }
            let mut fill = palette.block_fill(&block.occurrence.color);
            if dragged.as_deref() == Some(block.occurrence.id.as_str()) {
                fill = with_alpha(fill, 80);
            } else if block.occurrence.read_only {
                fill = with_alpha(fill, 170);
            }
            painter.rect_filled(rect, 3.0, fill);
            painter.text(
                rect.min + Vec2::new(4.0, 2.0),
                Align2::LEFT_TOP,
                &block.occurrence.title,
                FontId::proportional(12.0),
                palette.block_text,
            );
        }

        if let Some(overlay) = &frame.drag_overlay {
            let x = grid_rect.left() + overlay.column as f32 * column_width;
            let rect = Rect::from_min_size(
                Pos2::new(x, to_screen_y(overlay.top)),
                Vec2::new(column_width - 2.0, overlay.height),
            );
            let color = controller
                .repository()
                .get(&overlay.occurrence_id)
                .map(|occurrence| palette.block_fill(&occurrence.color))
                .unwrap_or(palette.create_border);
            painter.rect_filled(rect, 3.0, with_alpha(color, 220));
            painter.rect_stroke(rect, 3.0, Stroke::new(2.0, palette.block_text));
        }

        if let Some(overlay) = frame.create_overlay {
            let x = grid_rect.left() + overlay.column as f32 * column_width;
            let rect = Rect::from_min_max(
                Pos2::new(x, to_screen_y(overlay.top)),
                Pos2::new(x + column_width - 2.0, to_screen_y(overlay.bottom)),
            );
            painter.rect_filled(rect, 3.0, palette.create_fill);
            painter.rect_stroke(rect, 3.0, Stroke::new(1.5, palette.create_border));
            let minutes = grid.pixels_to_minutes(overlay.top);
            painter.text(
                rect.min + Vec2::new(4.0, 2.0),
                Align2::LEFT_TOP,
                format!("{:02}:{:02}", minutes / 60, minutes % 60),
                FontId::proportional(12.0),
                palette.create_border,
            );
        }

        result
    }

    fn feed_input(
        ui: &egui::Ui,
        controller: &mut TimelineController,
        grid_rect: Rect,
        response: &egui::Response,
    ) {
        let now = Instant::now();
        let to_local = |p: Pos2| Pos2::new(p.x - grid_rect.left(), p.y - grid_rect.top());

        let (pressed, released, position, pointer_delta, wheel, escape) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.pointer.delta(),
                i.smooth_scroll_delta.y,
                i.key_pressed(egui::Key::Escape),
            )
        });

        if pressed {
            if let Some(position) = position.filter(|p| grid_rect.contains(*p)) {
                controller.handle_pointer(PointerEvent::Pressed(to_local(position)), now);
            }
        }

        if let Some(position) = position {
            if pointer_delta != Vec2::ZERO {
                controller.handle_pointer(PointerEvent::Moved(to_local(position)), now);
            }
        }

        if response.dragged() && controller.scroll_enabled() {
            controller.scroll_by(-pointer_delta.y);
        }

        if released {
            controller.handle_pointer(PointerEvent::Released, now);
        }
        if escape {
            controller.handle_pointer(PointerEvent::Cancelled, now);
        }

        if response.hovered() && wheel != 0.0 {
            controller.scroll_by(-wheel);
        }

        controller.tick(now);

        if !controller.scroll_enabled() || controller.pending_commits() > 0 {
            ui.ctx().request_repaint();
        } else if ui.input(|i| i.pointer.primary_down()) {
            // Long press needs frames while the button is held still
            ui.ctx()
                .request_repaint_after(std::time::Duration::from_millis(50));
        }
    }

    fn draw_header(
        ui: &egui::Ui,
        header: Rect,
        days: &[NaiveDate],
        column_width: f32,
        palette: &TimelinePalette,
    ) -> Option<NaiveDate> {
        let mut clicked = None;
        let painter = ui.painter_at(header);
        for (column, day) in days.iter().enumerate() {
            let rect = Rect::from_min_size(
                Pos2::new(
                    header.left() + TIME_LABEL_WIDTH + column as f32 * column_width,
                    header.top(),
                ),
                Vec2::new(column_width, header.height()),
            );
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                format!("{} {}", day.format("%a"), day.day()),
                FontId::proportional(13.0),
                palette.label,
            );
            if ui
                .interact(rect, ui.id().with(("timeline_header", column)), Sense::click())
                .clicked()
            {
                clicked = Some(*day);
            }
        }
        clicked
    }

    /// All-day strip; returns the height it used.
    fn draw_week_band(
        ui: &egui::Ui,
        controller: &TimelineController,
        top: f32,
        full: Rect,
        column_width: f32,
        palette: &TimelinePalette,
    ) -> f32 {
        let band = controller.week_band();
        let has_overflow = band.overflow_per_day.iter().any(|count| *count > 0);
        let rows = band.row_count + usize::from(has_overflow);
        if rows == 0 {
            return 0.0;
        }

        let height = rows as f32 * BAND_ROW_HEIGHT + 4.0;
        let area = Rect::from_min_size(Pos2::new(full.left(), top), Vec2::new(full.width(), height));
        let painter = ui.painter_at(area);
        let left = area.left() + TIME_LABEL_WIDTH;

        for block in &band.blocks {
            let rect = Rect::from_min_size(
                Pos2::new(
                    left + block.start_column as f32 * column_width + 1.0,
                    top + 2.0 + block.row as f32 * BAND_ROW_HEIGHT,
                ),
                Vec2::new(block.span() as f32 * column_width - 2.0, BAND_ROW_HEIGHT - 2.0),
            );
            painter.rect_filled(rect, 3.0, palette.block_fill(&block.occurrence.color));
            painter.text(
                rect.left_center() + Vec2::new(4.0, 0.0),
                Align2::LEFT_CENTER,
                &block.occurrence.title,
                FontId::proportional(11.0),
                palette.block_text,
            );
        }

        for (column, count) in band.overflow_per_day.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            painter.text(
                Pos2::new(
                    left + column as f32 * column_width + 4.0,
                    top + 2.0 + band.row_count as f32 * BAND_ROW_HEIGHT,
                ),
                Align2::LEFT_TOP,
                format!("+{}", count),
                FontId::proportional(11.0),
                palette.overflow_text,
            );
        }

        height
    }
}
