mod app;
mod input;
mod theme;

use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use anyhow::{Context, Result};
use clicktui_core::{
    config::{self, AppConfig},
    Controller,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(game = %config.game.display_name(), "Starting clicktui");

    let theme = Theme::from_config(&config.theme);
    let controller = Controller::new(config);
    let mut app = app::ClickApp::new(controller, theme);
    app.run().await
}

// The terminal belongs to the UI, so logs only go to the file.
fn init_logging(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create {}", config.log_dir.display()))?;
    let log_path = config.log_dir.join("clicktui.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
