#![warn(clippy::all, missing_docs)]

//! Core game logic for clicktui.
//!
//! This crate hosts the domain models, configuration handling, the panel
//! contract with its implementations, and the controller that routes events
//! between panels. It has no terminal dependency; the `clicktui-tui` crate
//! draws what the controller exposes and feeds it input.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod layout;
pub mod models;
pub mod panel;
pub mod progress;
pub mod runtime;
pub mod spinner;
pub mod status;

pub use config::AppConfig;
pub use controller::{Controller, GlobalState};
pub use error::GameError;
pub use event::{Command, Event, Key};
pub use models::{Entity, GameInfo, PanelKind};
pub use panel::{Panel, PanelView};
pub use runtime::Runtime;
