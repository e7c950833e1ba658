use super::TimelineApp;
use crate::models::ui::ViewType;
use chrono::Local;

impl TimelineApp {
    pub(super) fn navigate_previous(&mut self) {
        self.current_date = self.current_view.step(self.current_date, false);
        self.sync_range();
    }

    pub(super) fn navigate_next(&mut self) {
        self.current_date = self.current_view.step(self.current_date, true);
        self.sync_range();
    }

    pub(super) fn jump_to_today(&mut self) {
        self.current_date = Local::now().date_naive();
        self.sync_range();
    }

    pub(super) fn switch_view(&mut self, view: ViewType) {
        if self.current_view == view {
            self.sync_range();
            return;
        }
        log::debug!("Switching view {:?} -> {:?}", self.current_view, view);
        self.current_view = view;
        // Each view prefetches a different window
        self.loaded_range = None;
        self.sync_range();
    }
}
