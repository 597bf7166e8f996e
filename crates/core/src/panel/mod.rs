//! The panel contract shared by every tab, plus the read-only views that
//! travel between panels and the controller.

mod collection;
mod overview;

pub use collection::{CollectionPanel, Descriptor};
pub use overview::OverviewPanel;

use std::fmt;

use crate::{
    event::{Command, Event, SpinnerId},
    models::{Entity, PanelKind},
    progress::Progress,
};

/// A key and what it does, for help listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Key label as shown in the footer, e.g. `"enter"`.
    pub keys: &'static str,
    /// Short description of the action.
    pub help: &'static str,
}

impl KeyBinding {
    /// Pair a key label with its description.
    pub const fn new(keys: &'static str, help: &'static str) -> Self {
        Self { keys, help }
    }
}

/// Copy of a panel's collection carried by its readiness event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    /// Panel the readiness event is addressed to.
    pub kind: PanelKind,
    /// Collection at load time.
    pub entities: Vec<Entity>,
}

/// Per-entity yields of payout-eligible entities.
///
/// This is the only view one panel gets of another panel's collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    yields: Vec<u64>,
}

impl Ledger {
    /// Record the current yield of every entity.
    pub fn from_entities(entities: &[Entity]) -> Self {
        Self {
            yields: entities.iter().map(Entity::yield_per_cycle).collect(),
        }
    }

    /// Append the entries of another ledger.
    pub fn extend(&mut self, other: Ledger) {
        self.yields.extend(other.yields);
    }

    /// Amount one payout cycle is worth: `Σ level × cost`.
    pub fn payout(&self) -> u64 {
        self.yields
            .iter()
            .fold(0u64, |sum, amount| sum.saturating_add(*amount))
    }
}

/// Per-dispatch capabilities handed to a panel's `update`.
#[derive(Debug)]
pub struct PanelContext<'a> {
    ledger: &'a Ledger,
    resources: u64,
    payout: u64,
}

impl<'a> PanelContext<'a> {
    /// Context over `ledger` with the total as it stood before the dispatch.
    pub fn new(ledger: &'a Ledger, resources: u64) -> Self {
        Self {
            ledger,
            resources,
            payout: 0,
        }
    }

    /// Read-only payout ledger of the whole game.
    pub fn ledger(&self) -> &Ledger {
        self.ledger
    }

    /// Resource total including payouts requested during this dispatch.
    pub fn resources(&self) -> u64 {
        self.resources.saturating_add(self.payout)
    }

    /// Ask the controller to add `amount` to the resource total.
    pub fn pay_out(&mut self, amount: u64) {
        self.payout = self.payout.saturating_add(amount);
    }

    /// Payouts requested so far in this dispatch.
    pub fn payout(&self) -> u64 {
        self.payout
    }
}

/// One list row as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    /// Entity name.
    pub title: String,
    /// Secondary line, e.g. level and cost.
    pub description: String,
}

/// Structured rendering of a panel, drawn by the frontend.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    /// Heading of the body.
    pub title: String,
    /// Spinner frame while the panel is still loading.
    pub loading: Option<&'static str>,
    /// List rows that fit the panel's height.
    pub rows: Vec<ViewRow>,
    /// Highlighted entry of `rows`.
    pub selected: Option<usize>,
    /// Free-form text below the list.
    pub lines: Vec<String>,
    /// Progress meter, if the panel runs one.
    pub progress: Option<Progress>,
}

impl PanelView {
    /// View showing only a spinner frame.
    pub fn loading(title: impl Into<String>, frame: &'static str) -> Self {
        Self {
            title: title.into(),
            loading: Some(frame),
            rows: Vec::new(),
            selected: None,
            lines: Vec::new(),
            progress: None,
        }
    }

    /// Plain-text rendering.
    pub fn to_text(&self) -> String {
        if let Some(frame) = self.loading {
            return format!("{frame}loading…");
        }
        let mut out = vec![self.title.clone(), String::new()];
        for (index, row) in self.rows.iter().enumerate() {
            let marker = if self.selected == Some(index) { ">" } else { " " };
            out.push(format!("{marker} {}", row.title));
            out.push(format!("  {}", row.description));
        }
        out.extend(self.lines.iter().cloned());
        if let Some(progress) = &self.progress {
            out.push(String::new());
            out.push(progress.render());
        }
        out.join("\n")
    }
}

/// Capabilities every tab provides to the controller.
pub trait Panel: fmt::Debug {
    /// Which aspect of the game this panel shows.
    fn kind(&self) -> PanelKind;

    /// Stable identity used to route readiness events.
    fn tab_name(&self) -> &'static str {
        self.kind().tab_name()
    }

    /// Display path, e.g. `/buildings`.
    fn path(&self) -> &'static str {
        self.kind().path()
    }

    /// Begin loading: schedule the load routine and start the spinner.
    fn init(&mut self) -> Vec<Command>;

    /// Deferred load routine; yields a readiness event or an error event.
    fn load(&self) -> Event;

    /// Handle one event, returning follow-up work.
    fn update(&mut self, event: &Event, ctx: &mut PanelContext<'_>) -> Vec<Command>;

    /// Current view model.
    fn view(&self) -> PanelView;

    /// Text rendering of [`Panel::view`].
    fn render(&self) -> String {
        self.view().to_text()
    }

    /// Terminal width and the rows left for the panel body.
    fn set_size(&mut self, width: u16, height: u16);

    /// Bindings shown in the one-line footer.
    fn short_help(&self) -> Vec<KeyBinding>;

    /// Grouped bindings shown when help is expanded.
    fn full_help(&self) -> Vec<Vec<KeyBinding>>;

    /// Id carried by this panel's spinner ticks.
    fn spinner_id(&self) -> SpinnerId;

    /// `true` until the readiness event arrives.
    fn is_loading(&self) -> bool;

    /// Middle section of the status line.
    fn status_value(&self) -> String;

    /// Right section of the status line.
    fn status_detail(&self) -> String;

    /// Payout capability; `None` for panels that do not pay out.
    fn ledger(&self) -> Option<Ledger> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_sums_level_times_cost() {
        let ledger = Ledger::from_entities(&[
            Entity::new("Building 1", 1, 100),
            Entity::new("Building 2", 1, 200),
            Entity::new("Building 3", 1, 300),
        ]);
        assert_eq!(ledger.payout(), 600);
    }

    #[test]
    fn context_accumulates_payouts() {
        let ledger = Ledger::default();
        let mut ctx = PanelContext::new(&ledger, 40);
        ctx.pay_out(2);
        ctx.pay_out(3);
        assert_eq!(ctx.payout(), 5);
        assert_eq!(ctx.resources(), 45);
    }

    #[test]
    fn loading_view_is_spinner_only() {
        let view = PanelView::loading("Buildings", "⣾ ");
        assert_eq!(view.to_text(), "⣾ loading…");
    }
}
