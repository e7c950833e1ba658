use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::settings::TimelineSettings;

const SETTINGS_FILE: &str = "timeline.toml";

pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Service bound to the per-user config directory, if the platform has one.
    pub fn for_user() -> Option<Self> {
        ProjectDirs::from("com", "CalendarTimeline", "CalendarTimeline")
            .map(|dirs| Self::new(dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current settings
    pub fn get(&self) -> Result<TimelineSettings> {
        Self::load_from(&self.path)
    }

    /// Validate and write settings
    pub fn update(&self, settings: &TimelineSettings) -> Result<()> {
        Self::save_to(&self.path, settings)
    }

    pub fn load_from(path: &Path) -> Result<TimelineSettings> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: TimelineSettings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;
        Ok(settings)
    }

    pub fn save_to(path: &Path, settings: &TimelineSettings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Settings from the user config file, or defaults when it is missing or broken.
    pub fn load_or_default() -> TimelineSettings {
        let Some(service) = Self::for_user() else {
            log::warn!("No config directory available, using default settings");
            return TimelineSettings::default();
        };

        if !service.path().exists() {
            log::info!(
                "No settings file at {}, using defaults",
                service.path().display()
            );
            return TimelineSettings::default();
        }

        match service.get() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings: {:#}, using defaults", e);
                TimelineSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ui::ViewType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("timeline.toml");

        let settings = TimelineSettings {
            hour_height: 48.0,
            default_view: ViewType::Day,
            time_zone: chrono_tz::Europe::Berlin,
            ..Default::default()
        };
        SettingsService::save_to(&path, &settings).unwrap();

        let loaded = SettingsService::new(&path).get().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_settings_are_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeline.toml");
        let settings = TimelineSettings {
            snap_minutes: 7,
            ..Default::default()
        };

        assert!(SettingsService::new(&path).update(&settings).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeline.toml");
        std::fs::write(&path, "hour_height = -5.0\n").unwrap();

        let err = SettingsService::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(SettingsService::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
