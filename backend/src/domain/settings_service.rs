use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

use shared::NotificationSettings;

/// Loads notification settings from a TOML file.
///
/// Every key is optional; omitted keys take the built-in defaults, so a
/// minimal file enabling one channel is enough.
pub struct SettingsService;

impl SettingsService {
    pub fn load_settings(config_path: &Path) -> Result<NotificationSettings> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read settings file: {:?}", config_path))?;

        let settings: NotificationSettings = toml::from_str(&config_content)
            .with_context(|| "Failed to parse settings TOML")?;

        Ok(settings)
    }

    pub fn load_settings_or_default(config_path: &Path) -> NotificationSettings {
        match Self::load_settings(config_path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings from {:?}: {}", config_path, e);
                info!("Using default notification settings (all channels disabled)");
                NotificationSettings::default()
            }
        }
    }
}
