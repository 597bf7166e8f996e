//! Events flowing through the controller and the deferred commands that
//! produce them.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    error::GameError,
    models::{GameInfo, PanelKind},
    panel::PanelSnapshot,
};

/// Identifier of one spinner animation cycle.
pub type SpinnerId = u64;

/// Keys the game reacts to, independent of the terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Upgrade the highlighted entity.
    Enter,
    /// Move the highlight up.
    Up,
    /// Move the highlight down.
    Down,
    /// Activate the next tab.
    NextTab,
    /// Activate the previous tab.
    PrevTab,
    /// Activate the tab at a zero-based index.
    Tab(usize),
    /// Leave the current view.
    Back,
    /// Terminate the program.
    Quit,
    /// Toggle the full help listing.
    Help,
    /// Any other printable key.
    Char(char),
}

/// Everything the controller can be asked to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Key press.
    Key(Key),
    /// Terminal size changed.
    Resize {
        /// Columns.
        width: u16,
        /// Rows.
        height: u16,
    },
    /// Periodic game timer fired.
    Timer(DateTime<Utc>),
    /// Request to activate the tab at an index.
    SelectTab(usize),
    /// A tab became active.
    TabActivated(usize),
    /// Request to activate the tab showing a panel kind.
    SwitchTab(PanelKind),
    /// A panel highlighted a different row.
    ItemActive {
        /// Panel that moved its highlight.
        kind: PanelKind,
        /// Newly highlighted row.
        index: usize,
    },
    /// A panel finished loading.
    PanelReady(PanelSnapshot),
    /// A panel failed to load.
    Error(GameError),
    /// Spinner animation frame.
    SpinnerTick(SpinnerId),
    /// Leave the current view.
    GoBack,
    /// Aggregate game metadata changed.
    Game(GameInfo),
    /// Terminal event with no meaning for the game.
    Unhandled(String),
}

impl Event {
    /// Whether the status line should be recomputed after this event.
    pub fn refreshes_status(&self) -> bool {
        matches!(
            self,
            Event::TabActivated(_)
                | Event::Key(_)
                | Event::ItemActive { .. }
                | Event::Game(_)
                | Event::GoBack
        )
    }
}

/// Deferred work returned from `init`/`update`, resolved into events by the
/// scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Stop the event loop.
    Quit,
    /// Re-inject an event on the next turn.
    Emit(Event),
    /// Run a panel's load routine and inject its outcome.
    Load(PanelKind),
    /// Fire [`Event::Timer`] after a delay.
    Timer(Duration),
    /// Fire [`Event::SpinnerTick`] for `id` after a delay.
    Spinner {
        /// Spinner the frame belongs to.
        id: SpinnerId,
        /// Delay before the frame.
        after: Duration,
    },
}
