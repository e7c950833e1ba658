use chrono::Local;
use chrono_tz::Tz;
use egui::RichText;

use super::palette::TimelinePalette;
use crate::models::occurrence::EventOccurrence;
use crate::timeline::week_band::group_by_day;

pub struct ListView;

impl ListView {
    /// Agenda of loaded occurrences grouped by start day. Returns the id of a
    /// clicked entry.
    pub fn show(ui: &mut egui::Ui, occurrences: &[EventOccurrence], tz: Tz) -> Option<String> {
        let palette = TimelinePalette::from_visuals(ui.visuals());
        let sections = group_by_day(occurrences, tz);
        let today = Local::now().date_naive();
        let mut tapped = None;

        if sections.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("No events in this range");
            });
            return None;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (day, items) in sections {
                    let mut heading = RichText::new(day.format("%A, %B %-d").to_string()).strong();
                    if day == today {
                        heading = heading.color(palette.create_border);
                    }
                    ui.label(heading);

                    for occurrence in items {
                        let when = if occurrence.is_all_day() {
                            "All day".to_string()
                        } else {
                            format!(
                                "{} - {}",
                                occurrence.start.in_zone(tz).format("%H:%M"),
                                occurrence.end.in_zone(tz).format("%H:%M")
                            )
                        };
                        ui.horizontal(|ui| {
                            ui.colored_label(palette.block_fill(&occurrence.color), "⏺");
                            ui.label(RichText::new(when).monospace());
                            if ui.link(occurrence.title.as_str()).clicked() {
                                tapped = Some(occurrence.id.clone());
                            }
                        });
                    }
                    ui.add_space(8.0);
                }
            });

        tapped
    }
}
