//! Application configuration.
//!
//! Values are layered from built-in defaults, an optional TOML file under the
//! user's config directory and `CLICKTUI_*` environment variables, in that
//! order. The resulting [`AppConfig`] is passed by value into the controller;
//! nothing here is global.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::GameInfo;

/// Directory under `~/.config` holding the configuration file.
pub const CONFIG_DIR: &str = "clicktui";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG: &str = r##"# clicktui configuration

ready_policy = "first_panel"
log_dir = "logs"
save_file = "clicktui.save"

[game]
name = "Game"
description = ""
project_name = ""

[timing]
tick_interval_ms = 2000
spinner_interval_ms = 100
overview_step = 0.1
buildings_step = 0.25

[layout]
header_height = 2
tab_height = 1
status_height = 1
padding = 2
max_progress_width = 80

[theme]
accent = "#7d56f4"
muted = "#6c6c6c"
highlight = "#ee6ff8"
"##;

/// When the controller's global state leaves `Loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyPolicy {
    /// The first panel to finish loading readies the whole game.
    #[default]
    FirstPanel,
    /// Every panel has to finish loading.
    AllPanels,
}

/// Fixed-interval timing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Period of the game timer.
    pub tick_interval_ms: u64,
    /// Delay between spinner frames.
    pub spinner_interval_ms: u64,
    /// Overview progress gained per timer tick.
    pub overview_step: f64,
    /// Buildings progress gained per timer tick.
    pub buildings_step: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2000,
            spinner_interval_ms: 100,
            overview_step: 0.1,
            buildings_step: 0.25,
        }
    }
}

impl TimingConfig {
    /// Game timer period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Spinner frame period.
    pub fn spinner_interval(&self) -> Duration {
        Duration::from_millis(self.spinner_interval_ms)
    }
}

/// Screen regions reserved around the active panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Rows used by the header.
    pub header_height: u16,
    /// Rows used by the tab strip.
    pub tab_height: u16,
    /// Rows used by the status line.
    pub status_height: u16,
    /// Horizontal padding on each side of a progress bar.
    pub padding: u16,
    /// Upper bound on progress bar width.
    pub max_progress_width: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_height: 2,
            tab_height: 1,
            status_height: 1,
            padding: 2,
            max_progress_width: 80,
        }
    }
}

/// Hex colours consumed by the terminal frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Active tab, status title and progress bars.
    pub accent: String,
    /// Borders, descriptions and inactive tabs.
    pub muted: String,
    /// Highlighted list row.
    pub highlight: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#7d56f4".to_string(),
            muted: "#6c6c6c".to_string(),
            highlight: "#ee6ff8".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Header metadata.
    pub game: GameInfo,
    /// Timer and progress settings.
    pub timing: TimingConfig,
    /// Layout margins.
    pub layout: LayoutConfig,
    /// Global readiness rule.
    pub ready_policy: ReadyPolicy,
    /// Directory receiving `clicktui.log`.
    pub log_dir: PathBuf,
    /// Reserved for a save format; never read or written.
    pub save_file: PathBuf,
    /// Frontend colours.
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameInfo {
                name: "Game".to_string(),
                ..GameInfo::default()
            },
            timing: TimingConfig::default(),
            layout: LayoutConfig::default(),
            ready_policy: ReadyPolicy::default(),
            log_dir: PathBuf::from("logs"),
            save_file: PathBuf::from("clicktui.save"),
            theme: ThemeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from `path` (optional) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("CLICKTUI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize config")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, ignoring the environment.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .context("failed to parse config")?
            .try_deserialize()
            .context("failed to deserialize config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.timing.tick_interval_ms > 0,
            "timing.tick_interval_ms must be positive"
        );
        ensure!(
            self.timing.spinner_interval_ms > 0,
            "timing.spinner_interval_ms must be positive"
        );
        for (name, step) in [
            ("overview_step", self.timing.overview_step),
            ("buildings_step", self.timing.buildings_step),
        ] {
            ensure!(
                step > 0.0 && step <= 1.0,
                "timing.{name} must be within (0, 1], got {step}"
            );
        }
        Ok(())
    }
}

/// Location of the configuration file.
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("unable to determine config directory")?;
    Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_matches_defaults() -> Result<()> {
        let parsed = AppConfig::from_toml(DEFAULT_CONFIG)?;
        assert_eq!(parsed, AppConfig::default());
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let parsed = AppConfig::from_toml(
            r#"
ready_policy = "all_panels"

[timing]
tick_interval_ms = 500
"#,
        )?;
        assert_eq!(parsed.ready_policy, ReadyPolicy::AllPanels);
        assert_eq!(parsed.timing.tick_interval(), Duration::from_millis(500));
        assert_eq!(parsed.timing.overview_step, 0.1);
        assert_eq!(parsed.layout, LayoutConfig::default());
        Ok(())
    }

    #[test]
    fn rejects_out_of_range_step() {
        let err = AppConfig::from_toml("[timing]\noverview_step = 1.5\n")
            .expect_err("step above one must fail");
        assert!(err.to_string().contains("overview_step"));
    }

    #[test]
    fn writes_default_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, DEFAULT_CONFIG);

        fs::write(&path, "[game]\nname = \"Custom\"\n")?;
        write_default_config(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.game.name, "Custom");
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.toml"))?;
        assert_eq!(config.timing, TimingConfig::default());
        Ok(())
    }
}
