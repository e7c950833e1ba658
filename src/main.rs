// Calendar Timeline
// Desktop shell over the timeline engine

use std::path::PathBuf;
use std::sync::Arc;

use calendar_timeline::models::settings::TimelineSettings;
use calendar_timeline::services::bridge::{CalendarBridge, InMemoryBridge};
use calendar_timeline::services::settings::SettingsService;
use calendar_timeline::ui_egui::TimelineApp;
use calendar_timeline::utils::date::week_start;
use chrono::Local;

fn main() -> eframe::Result<()> {
    env_logger::init();

    log::info!("Starting Calendar Timeline");

    let settings = SettingsService::load_or_default();

    // Optional JSON file of occurrences; otherwise a sample week
    let bridge: Arc<dyn CalendarBridge> = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match InMemoryBridge::from_json_file(&path) {
            Ok(bridge) => Arc::new(bridge),
            Err(e) => {
                log::error!("{:#}", e);
                log::warn!("Falling back to sample events");
                Arc::new(sample_bridge(&settings))
            }
        },
        None => Arc::new(sample_bridge(&settings)),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Calendar Timeline")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Calendar Timeline",
        options,
        Box::new(move |_cc| Ok(Box::new(TimelineApp::new(settings, bridge)))),
    )
}

fn sample_bridge(settings: &TimelineSettings) -> InMemoryBridge {
    let today = Local::now().date_naive();
    InMemoryBridge::with_sample_week(
        week_start(today, settings.first_day_of_week),
        settings.time_zone,
    )
}
