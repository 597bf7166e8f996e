use tracing::{debug, info};

use crate::{
    config::{LayoutConfig, TimingConfig},
    event::{Command, Event, SpinnerId},
    layout::progress_width,
    models::PanelKind,
    progress::Progress,
    spinner::Spinner,
};

use super::{KeyBinding, Panel, PanelContext, PanelSnapshot, PanelView};

/// Resource aggregation tab.
///
/// Fills its own progress bar on every timer tick. Each time the bar fills,
/// the payout of the buildings ledger is requested from the controller.
#[derive(Debug)]
pub struct OverviewPanel {
    spinner: Spinner,
    is_loading: bool,
    progress: Progress,
    layout: LayoutConfig,
    game_name: String,
    resources: u64,
    rate: u64,
    last_payout: Option<u64>,
    cycles: u64,
}

impl OverviewPanel {
    /// Empty overview; it learns the total and rate from the first dispatch.
    pub fn new(spinner: Spinner, timing: &TimingConfig, layout: LayoutConfig) -> Self {
        Self {
            spinner,
            is_loading: true,
            progress: Progress::new(timing.overview_step),
            layout,
            game_name: String::new(),
            resources: 0,
            rate: 0,
            last_payout: None,
            cycles: 0,
        }
    }

    /// Payout meter.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Resource total as of the last event this panel saw.
    pub fn resources(&self) -> u64 {
        self.resources
    }

    /// Amount paid by the most recent full cycle.
    pub fn last_payout(&self) -> Option<u64> {
        self.last_payout
    }

    /// Completed payout cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn tick(&mut self, ctx: &mut PanelContext<'_>) {
        if !self.progress.advance() {
            return;
        }
        let amount = ctx.ledger().payout();
        ctx.pay_out(amount);
        self.cycles += 1;
        self.last_payout = Some(amount);
        info!(amount, cycles = self.cycles, "Payout cycle complete");
    }
}

impl Panel for OverviewPanel {
    fn kind(&self) -> PanelKind {
        PanelKind::Overview
    }

    fn init(&mut self) -> Vec<Command> {
        if !self.is_loading {
            return Vec::new();
        }
        vec![Command::Load(PanelKind::Overview), self.spinner.tick()]
    }

    fn load(&self) -> Event {
        Event::PanelReady(PanelSnapshot {
            kind: PanelKind::Overview,
            entities: Vec::new(),
        })
    }

    fn update(&mut self, event: &Event, ctx: &mut PanelContext<'_>) -> Vec<Command> {
        let mut cmds = Vec::new();
        match event {
            Event::Timer(_) => self.tick(ctx),
            Event::PanelReady(snapshot) if snapshot.kind == PanelKind::Overview => {
                if self.is_loading {
                    self.is_loading = false;
                    debug!("Overview ready");
                }
            }
            Event::SpinnerTick(id) if self.is_loading => {
                cmds.extend(self.spinner.update(*id));
            }
            Event::Game(info) => self.game_name = info.name.clone(),
            _ => {}
        }
        self.resources = ctx.resources();
        self.rate = ctx.ledger().payout();
        cmds
    }

    fn view(&self) -> PanelView {
        if self.is_loading {
            return PanelView::loading(self.tab_name(), self.spinner.view());
        }
        let title = if self.game_name.is_empty() {
            self.tab_name().to_string()
        } else {
            format!("{} · {}", self.game_name, self.tab_name())
        };
        let mut lines = vec![
            format!("Money: {}", self.resources),
            format!("Income per cycle: {}", self.rate),
        ];
        if let Some(amount) = self.last_payout {
            lines.push(format!("Last payout: {amount}"));
        }
        PanelView {
            title,
            loading: None,
            rows: Vec::new(),
            selected: None,
            lines,
            progress: Some(self.progress.clone()),
        }
    }

    fn set_size(&mut self, width: u16, _height: u16) {
        self.progress
            .set_width(progress_width(&self.layout, width));
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        Vec::new()
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        Vec::new()
    }

    fn spinner_id(&self) -> SpinnerId {
        self.spinner.id()
    }

    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn status_value(&self) -> String {
        format!("Money: {}", self.resources)
    }

    fn status_detail(&self) -> String {
        "Overview Tab".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::{
        models::{starter_entities, Entity},
        panel::Ledger,
    };

    fn overview() -> OverviewPanel {
        OverviewPanel::new(
            Spinner::new(2, Duration::from_millis(100)),
            &TimingConfig::default(),
            LayoutConfig::default(),
        )
    }

    #[test]
    fn pays_ledger_once_per_full_bar() {
        let mut panel = overview();
        let ledger = Ledger::from_entities(&starter_entities(PanelKind::Buildings));
        let mut paid = Vec::new();
        for _ in 0..20 {
            let mut ctx = PanelContext::new(&ledger, 0);
            panel.update(&Event::Timer(Utc::now()), &mut ctx);
            paid.push(ctx.payout());
        }
        let payouts: Vec<(usize, u64)> = paid
            .into_iter()
            .enumerate()
            .filter(|(_, amount)| *amount > 0)
            .collect();
        assert_eq!(payouts, vec![(9, 600), (19, 600)]);
        assert_eq!(panel.progress().fraction(), 0.0);
        assert_eq!(panel.cycles(), 2);
    }

    #[test]
    fn payout_uses_levels_at_the_moment_of_fill() {
        let mut panel = overview();
        let before = Ledger::from_entities(&starter_entities(PanelKind::Buildings));
        for _ in 0..9 {
            let mut ctx = PanelContext::new(&before, 0);
            panel.update(&Event::Timer(Utc::now()), &mut ctx);
        }
        let after = Ledger::from_entities(&[
            Entity::new("Building 1", 2, 100),
            Entity::new("Building 2", 1, 200),
            Entity::new("Building 3", 1, 300),
        ]);
        let mut ctx = PanelContext::new(&after, 50);
        panel.update(&Event::Timer(Utc::now()), &mut ctx);
        assert_eq!(ctx.payout(), 700);
        assert_eq!(panel.resources(), 750);
        assert_eq!(panel.last_payout(), Some(700));
    }

    #[test]
    fn view_shows_money_after_ready() {
        let mut panel = overview();
        let ledger = Ledger::default();
        let mut ctx = PanelContext::new(&ledger, 1234);
        let ready = panel.load();
        panel.update(&ready, &mut ctx);
        let text = panel.render();
        assert!(text.contains("Money: 1234"));
        assert_eq!(panel.status_value(), "Money: 1234");
    }
}
