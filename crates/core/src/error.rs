//! Typed errors raised inside the game loop.

use thiserror::Error;

use crate::models::PanelKind;

/// Failures a panel can report through the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The panel's backing entity collection was absent at load time.
    #[error("missing {kind} collection")]
    MissingCollection {
        /// Panel whose collection is missing.
        kind: PanelKind,
    },
    /// A controller was assembled without any panel.
    #[error("controller needs at least one panel")]
    NoPanels,
}
