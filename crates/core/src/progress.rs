//! Fill-and-reset progress meter.

const FULL_TOLERANCE: f64 = 1e-9;

/// Fraction in `[0, 1)` that grows by a fixed step and empties when full.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    fraction: f64,
    step: f64,
    width: u16,
}

impl Progress {
    /// Empty meter gaining `step` per advance.
    pub fn new(step: f64) -> Self {
        Self {
            fraction: 0.0,
            step,
            width: 0,
        }
    }

    /// Current fill in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Add one step. Returns `true` when the meter filled and was reset to
    /// zero.
    pub fn advance(&mut self) -> bool {
        self.fraction += self.step;
        // Ten steps of 0.1 sum to slightly less than one.
        if self.fraction >= 1.0 - FULL_TOLERANCE {
            self.fraction = 0.0;
            true
        } else {
            false
        }
    }

    /// Bar width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Change the bar width.
    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    /// Text rendering of the bar at its current width.
    pub fn render(&self) -> String {
        let width = usize::from(self.width.max(10));
        let filled = ((self.fraction * width as f64).round() as usize).min(width);
        format!(
            "{}{} {:>3}%",
            "█".repeat(filled),
            "░".repeat(width - filled),
            (self.fraction * 100.0).round() as u32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenth_steps_fill_after_ten_ticks() {
        let mut progress = Progress::new(0.1);
        for _ in 0..9 {
            assert!(!progress.advance());
        }
        assert!(progress.advance());
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn quarter_steps_fill_after_four_ticks() {
        let mut progress = Progress::new(0.25);
        let fills: Vec<bool> = (0..8).map(|_| progress.advance()).collect();
        assert_eq!(
            fills,
            vec![false, false, false, true, false, false, false, true]
        );
    }

    #[test]
    fn render_reports_percentage() {
        let mut progress = Progress::new(0.5);
        progress.set_width(10);
        progress.advance();
        assert_eq!(progress.render(), "█████░░░░░  50%");
    }
}
