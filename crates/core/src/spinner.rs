//! Loading spinner animation state.

use std::time::Duration;

use crate::event::{Command, SpinnerId};

const DOT_FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Hands out spinner ids in increasing order.
#[derive(Debug, Default)]
pub struct SpinnerIds {
    next: SpinnerId,
}

impl SpinnerIds {
    /// Allocate the next id, starting at 1.
    pub fn next_id(&mut self) -> SpinnerId {
        self.next += 1;
        self.next
    }
}

/// One spinner animation. Frames only advance for ticks carrying its id.
#[derive(Debug, Clone)]
pub struct Spinner {
    id: SpinnerId,
    frame: usize,
    interval: Duration,
}

impl Spinner {
    /// Spinner at its first frame, ticking every `interval`.
    pub fn new(id: SpinnerId, interval: Duration) -> Self {
        Self {
            id,
            frame: 0,
            interval,
        }
    }

    /// Id its ticks carry.
    pub fn id(&self) -> SpinnerId {
        self.id
    }

    /// Command scheduling the next frame.
    pub fn tick(&self) -> Command {
        Command::Spinner {
            id: self.id,
            after: self.interval,
        }
    }

    /// Advance one frame if `id` is ours, returning the follow-up tick.
    pub fn update(&mut self, id: SpinnerId) -> Option<Command> {
        if id != self.id {
            return None;
        }
        self.frame = (self.frame + 1) % DOT_FRAMES.len();
        Some(self.tick())
    }

    /// Index of the current frame.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Glyph of the current frame.
    pub fn view(&self) -> &'static str {
        DOT_FRAMES[self.frame]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let mut ids = SpinnerIds::default();
        let first = ids.next_id();
        let second = ids.next_id();
        assert!(second > first);
    }

    #[test]
    fn foreign_ticks_are_ignored() {
        let mut spinner = Spinner::new(3, Duration::from_millis(100));
        assert_eq!(spinner.update(4), None);
        assert_eq!(spinner.frame(), 0);

        let next = spinner.update(3);
        assert_eq!(spinner.frame(), 1);
        assert_eq!(
            next,
            Some(Command::Spinner {
                id: 3,
                after: Duration::from_millis(100)
            })
        );
    }

    #[test]
    fn frames_wrap() {
        let mut spinner = Spinner::new(1, Duration::from_millis(1));
        for _ in 0..DOT_FRAMES.len() {
            spinner.update(1);
        }
        assert_eq!(spinner.frame(), 0);
    }
}
