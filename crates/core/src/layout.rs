//! Screen geometry derived from the terminal size and [`LayoutConfig`].

use crate::config::LayoutConfig;

/// Regions of the frame for one terminal size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    /// Terminal columns.
    pub width: u16,
    /// Terminal rows.
    pub height: u16,
    /// Rows left for the active panel.
    pub body_height: u16,
}

impl Layout {
    /// Split a `width` by `height` terminal according to `config`.
    pub fn compute(config: &LayoutConfig, width: u16, height: u16) -> Self {
        let margins = config
            .header_height
            .saturating_add(config.tab_height)
            .saturating_add(config.status_height);
        Self {
            width,
            height,
            body_height: height.saturating_sub(margins),
        }
    }
}

/// Width of a progress bar inside a panel of `width` columns.
pub fn progress_width(config: &LayoutConfig, width: u16) -> u16 {
    width
        .saturating_sub(config.padding.saturating_mul(2).saturating_add(4))
        .min(config.max_progress_width)
}
