//! Status line derived from the active panel.

use chrono::{DateTime, Utc};

use crate::{event::Event, panel::Panel};

const PULSE: [&str; 2] = ["●", "○"];

/// What the status line shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Game name.
    pub title: String,
    /// Active panel's headline number.
    pub value: String,
    /// Active panel's position or label.
    pub detail: String,
    /// Trailing marker glyph.
    pub marker: String,
}

/// Keeps the status snapshot in step with the active panel.
#[derive(Debug, Default)]
pub struct StatusLine {
    snapshot: StatusSnapshot,
    width: u16,
    beats: u64,
    last_tick: Option<DateTime<Utc>>,
}

impl StatusLine {
    /// Blank status line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the snapshot before the first sync.
    pub fn init(&mut self) {
        self.snapshot = StatusSnapshot::default();
        self.beats = 0;
        self.last_tick = None;
    }

    /// Replace every section at once.
    pub fn set_status(
        &mut self,
        title: impl Into<String>,
        value: impl Into<String>,
        detail: impl Into<String>,
        marker: impl Into<String>,
    ) {
        self.snapshot = StatusSnapshot {
            title: title.into(),
            value: value.into(),
            detail: detail.into(),
            marker: marker.into(),
        };
    }

    /// Recompute the snapshot from `panel`.
    pub fn sync(&mut self, title: &str, panel: &dyn Panel) {
        self.set_status(title, panel.status_value(), panel.status_detail(), "*");
    }

    /// Every dispatched event passes through here.
    pub fn update(&mut self, event: &Event) {
        match event {
            Event::Timer(at) => {
                self.beats += 1;
                self.last_tick = Some(*at);
            }
            Event::Resize { width, .. } => self.width = *width,
            _ => {}
        }
    }

    /// Sections as last computed.
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Timestamp of the latest timer event.
    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        self.last_tick
    }

    /// Heartbeat glyph that flips on every timer tick.
    pub fn pulse(&self) -> &'static str {
        PULSE[(self.beats % 2) as usize]
    }

    /// One-line text rendering, cut to the terminal width.
    pub fn render(&self) -> String {
        let StatusSnapshot {
            title,
            value,
            detail,
            marker,
        } = &self.snapshot;
        let line = format!(" {title} │ {value} │ {detail} {marker} {}", self.pulse());
        if self.width == 0 {
            return line;
        }
        line.chars().take(usize::from(self.width)).collect()
    }
}
