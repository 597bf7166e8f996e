use std::ops::Range;

use tracing::{debug, error, info};

use crate::{
    config::{LayoutConfig, TimingConfig},
    error::GameError,
    event::{Command, Event, Key, SpinnerId},
    layout::progress_width,
    models::{dedupe_by_name, Entity, PanelKind},
    progress::Progress,
    spinner::Spinner,
};

use super::{KeyBinding, Ledger, Panel, PanelContext, PanelSnapshot, PanelView, ViewRow};

/// What distinguishes one collection panel from another.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Kind of panel this describes.
    pub kind: PanelKind,
    /// Second line of a list row.
    pub describe: fn(&Entity) -> String,
    /// Status line value for the whole collection.
    pub summarize: fn(&[Entity]) -> String,
    /// Whether the collection feeds the overview payout.
    pub pays_out: bool,
    /// Whether the panel runs its own progress bar on timer ticks.
    pub has_progress: bool,
}

impl Descriptor {
    /// Labels and behaviour of the standard panel for `kind`.
    pub fn for_kind(kind: PanelKind) -> Self {
        match kind {
            PanelKind::Buildings => Self {
                kind,
                describe: |entity| format!("Level: {}, Cost: {}", entity.level, entity.cost),
                summarize: |entities| {
                    format!("Income: {}", Ledger::from_entities(entities).payout())
                },
                pays_out: true,
                has_progress: true,
            },
            PanelKind::Capital => Self {
                kind,
                describe: |entity| format!("Value: {}", entity.level),
                summarize: |entities| format!("Money: ${}", total_value(entities)),
                pays_out: false,
                has_progress: false,
            },
            PanelKind::Weapons | PanelKind::Overview => Self {
                kind,
                describe: |entity| format!("Value: {}", entity.level),
                summarize: |entities| format!("Strength: {}", total_value(entities)),
                pays_out: false,
                has_progress: false,
            },
        }
    }
}

fn total_value(entities: &[Entity]) -> u64 {
    entities
        .iter()
        .fold(0u64, |sum, entity| sum.saturating_add(entity.level))
}

// Frame border plus the gap above a progress bar.
const FRAME_ROWS: u16 = 2;
const PROGRESS_ROWS: u16 = 2;
const LINES_PER_ROW: u16 = 2;

const SHORT_HELP: [KeyBinding; 2] = [
    KeyBinding::new("↑/↓", "navigate"),
    KeyBinding::new("enter", "upgrade"),
];

/// A list of upgradeable entities: buildings, capital or weapons.
#[derive(Debug)]
pub struct CollectionPanel {
    descriptor: Descriptor,
    entities: Option<Vec<Entity>>,
    rows: Vec<ViewRow>,
    selected: usize,
    is_loading: bool,
    spinner: Spinner,
    progress: Option<Progress>,
    cycles: u64,
    layout: LayoutConfig,
    height: u16,
}

impl CollectionPanel {
    /// Build a panel over `entities`; `None` models a collection that is
    /// missing at load time.
    pub fn new(
        descriptor: Descriptor,
        entities: Option<Vec<Entity>>,
        spinner: Spinner,
        timing: &TimingConfig,
        layout: LayoutConfig,
    ) -> Self {
        let entities = entities.map(dedupe_by_name);
        let progress = descriptor
            .has_progress
            .then(|| Progress::new(timing.buildings_step));
        let mut panel = Self {
            descriptor,
            entities,
            rows: Vec::new(),
            selected: 0,
            is_loading: true,
            spinner,
            progress,
            cycles: 0,
            layout,
            height: 0,
        };
        panel.rebuild_rows();
        debug!(kind = %descriptor.kind, rows = panel.rows.len(), "Collection panel created");
        panel
    }

    /// Backing collection; empty when it is missing.
    pub fn entities(&self) -> &[Entity] {
        self.entities.as_deref().unwrap_or_default()
    }

    /// Index of the highlighted entity.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Completed progress cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Progress meter, for kinds that run one.
    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// Rows that fit the body height, scrolled so the selection is visible.
    /// A panel that was never sized shows every row.
    fn visible_rows(&self) -> Range<usize> {
        let len = self.rows.len();
        if self.height == 0 {
            return 0..len;
        }
        let reserved = if self.progress.is_some() {
            FRAME_ROWS + PROGRESS_ROWS
        } else {
            FRAME_ROWS
        };
        let capacity = usize::from(self.height.saturating_sub(reserved) / LINES_PER_ROW).max(1);
        let start = (self.selected + 1).saturating_sub(capacity);
        start..(start + capacity).min(len)
    }

    fn rebuild_rows(&mut self) {
        let describe = self.descriptor.describe;
        self.rows = self
            .entities()
            .iter()
            .map(|entity| ViewRow {
                title: entity.name.clone(),
                description: describe(entity),
            })
            .collect();
    }

    fn move_selection(&mut self, delta: isize) -> Vec<Command> {
        let len = self.rows.len();
        if len == 0 {
            return Vec::new();
        }
        let next = self.selected.saturating_add_signed(delta).min(len - 1);
        if next == self.selected {
            return Vec::new();
        }
        self.selected = next;
        vec![Command::Emit(Event::ItemActive {
            kind: self.descriptor.kind,
            index: next,
        })]
    }

    fn upgrade_selected(&mut self) {
        let selected = self.selected;
        let Some(entity) = self
            .entities
            .as_mut()
            .and_then(|entities| entities.get_mut(selected))
        else {
            return;
        };
        entity.level = entity.level.saturating_add(1);
        info!(kind = %self.descriptor.kind, name = %entity.name, level = entity.level, "Upgraded entity");
        self.rebuild_rows();
    }

    fn advance_progress(&mut self) {
        let Some(progress) = self.progress.as_mut() else {
            return;
        };
        if progress.advance() {
            self.cycles += 1;
            debug!(kind = %self.descriptor.kind, cycles = self.cycles, "Progress bar hit 100%");
        }
    }
}

impl Panel for CollectionPanel {
    fn kind(&self) -> PanelKind {
        self.descriptor.kind
    }

    fn init(&mut self) -> Vec<Command> {
        debug!(kind = %self.descriptor.kind, loading = self.is_loading, "Collection panel init");
        if !self.is_loading {
            return Vec::new();
        }
        vec![Command::Load(self.descriptor.kind), self.spinner.tick()]
    }

    fn load(&self) -> Event {
        match &self.entities {
            Some(entities) => Event::PanelReady(PanelSnapshot {
                kind: self.descriptor.kind,
                entities: entities.clone(),
            }),
            None => {
                error!(kind = %self.descriptor.kind, "Missing collection");
                Event::Error(GameError::MissingCollection {
                    kind: self.descriptor.kind,
                })
            }
        }
    }

    fn update(&mut self, event: &Event, _ctx: &mut PanelContext<'_>) -> Vec<Command> {
        match event {
            Event::Key(key) if !self.is_loading => match key {
                Key::Up => return self.move_selection(-1),
                Key::Down => return self.move_selection(1),
                Key::Enter => self.upgrade_selected(),
                _ => {}
            },
            Event::PanelReady(snapshot) if snapshot.kind == self.descriptor.kind => {
                if self.is_loading {
                    self.is_loading = false;
                    info!(kind = %self.descriptor.kind, entities = snapshot.entities.len(), "Panel ready");
                }
            }
            Event::SpinnerTick(id) if self.is_loading => {
                return self.spinner.update(*id).into_iter().collect();
            }
            Event::Timer(_) => self.advance_progress(),
            _ => {}
        }
        Vec::new()
    }

    fn view(&self) -> PanelView {
        if self.is_loading {
            return PanelView::loading(self.tab_name(), self.spinner.view());
        }
        let window = self.visible_rows();
        PanelView {
            title: self.tab_name().to_string(),
            loading: None,
            selected: (!window.is_empty()).then(|| self.selected - window.start),
            rows: self.rows[window].to_vec(),
            lines: Vec::new(),
            progress: self.progress.clone(),
        }
    }

    fn set_size(&mut self, width: u16, height: u16) {
        self.height = height;
        let bar = progress_width(&self.layout, width);
        if let Some(progress) = self.progress.as_mut() {
            progress.set_width(bar);
        }
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        SHORT_HELP.to_vec()
    }

    fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        vec![
            SHORT_HELP.to_vec(),
            vec![
                KeyBinding::new("esc", "back"),
                KeyBinding::new("?", "toggle help"),
            ],
        ]
    }

    fn spinner_id(&self) -> SpinnerId {
        self.spinner.id()
    }

    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn status_value(&self) -> String {
        (self.descriptor.summarize)(self.entities())
    }

    fn status_detail(&self) -> String {
        let position = if self.rows.is_empty() {
            0
        } else {
            self.selected + 1
        };
        let mut detail = format!("☰ {position}/{}", self.rows.len());
        if self.progress.is_some() {
            detail.push_str(&format!(" ⟳ {}", self.cycles));
        }
        detail
    }

    fn ledger(&self) -> Option<Ledger> {
        self.descriptor
            .pays_out
            .then(|| Ledger::from_entities(self.entities()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::models::starter_entities;

    fn panel(kind: PanelKind) -> CollectionPanel {
        CollectionPanel::new(
            Descriptor::for_kind(kind),
            Some(starter_entities(kind)),
            Spinner::new(7, Duration::from_millis(100)),
            &TimingConfig::default(),
            LayoutConfig::default(),
        )
    }

    fn send(panel: &mut CollectionPanel, event: Event) -> Vec<Command> {
        let ledger = Ledger::default();
        let mut ctx = PanelContext::new(&ledger, 0);
        panel.update(&event, &mut ctx)
    }

    fn ready(kind: PanelKind) -> CollectionPanel {
        let mut panel = panel(kind);
        let event = panel.load();
        send(&mut panel, event);
        panel
    }

    #[test]
    fn init_schedules_load_and_spinner() {
        let mut panel = panel(PanelKind::Capital);
        let cmds = panel.init();
        assert_eq!(
            cmds,
            vec![
                Command::Load(PanelKind::Capital),
                Command::Spinner {
                    id: 7,
                    after: Duration::from_millis(100)
                },
            ]
        );
    }

    #[test]
    fn enter_upgrades_highlighted_entity_by_one() {
        let mut panel = ready(PanelKind::Buildings);
        send(&mut panel, Event::Key(Key::Down));
        for expected in 2..=4 {
            send(&mut panel, Event::Key(Key::Enter));
            assert_eq!(panel.entities()[1].level, expected);
        }
        assert_eq!(panel.entities()[0].level, 1);
        assert_eq!(panel.view().rows[1].description, "Level: 4, Cost: 200");
    }

    #[test]
    fn selection_is_clamped_and_announced() {
        let mut panel = ready(PanelKind::Weapons);
        assert!(send(&mut panel, Event::Key(Key::Up)).is_empty());
        let cmds = send(&mut panel, Event::Key(Key::Down));
        assert_eq!(
            cmds,
            vec![Command::Emit(Event::ItemActive {
                kind: PanelKind::Weapons,
                index: 1
            })]
        );
        send(&mut panel, Event::Key(Key::Down));
        assert!(send(&mut panel, Event::Key(Key::Down)).is_empty());
        assert_eq!(panel.selected(), 2);
    }

    #[test]
    fn loading_only_ends_once() {
        let mut panel = panel(PanelKind::Capital);
        assert!(panel.is_loading());
        let event = panel.load();
        send(&mut panel, event.clone());
        assert!(!panel.is_loading());
        send(&mut panel, event);
        send(&mut panel, Event::SpinnerTick(7));
        assert!(!panel.is_loading());
    }

    #[test]
    fn readiness_for_other_kind_is_ignored() {
        let mut panel = panel(PanelKind::Capital);
        let other = ready(PanelKind::Weapons).load();
        send(&mut panel, other);
        assert!(panel.is_loading());
    }

    #[test]
    fn input_is_ignored_while_loading() {
        let mut panel = panel(PanelKind::Buildings);
        send(&mut panel, Event::Key(Key::Enter));
        assert_eq!(panel.entities()[0].level, 1);
    }

    #[test]
    fn stale_spinner_ticks_change_nothing() {
        let mut panel = panel(PanelKind::Buildings);
        assert!(send(&mut panel, Event::SpinnerTick(6)).is_empty());
        assert_eq!(panel.view().loading, Some("⣾ "));

        let cmds = send(&mut panel, Event::SpinnerTick(7));
        assert_eq!(cmds.len(), 1);
        assert_eq!(panel.view().loading, Some("⣽ "));

        let event = panel.load();
        send(&mut panel, event);
        assert!(send(&mut panel, Event::SpinnerTick(7)).is_empty());
    }

    #[test]
    fn missing_collection_reports_error() {
        let panel = CollectionPanel::new(
            Descriptor::for_kind(PanelKind::Weapons),
            None,
            Spinner::new(1, Duration::from_millis(100)),
            &TimingConfig::default(),
            LayoutConfig::default(),
        );
        assert_eq!(
            panel.load(),
            Event::Error(GameError::MissingCollection {
                kind: PanelKind::Weapons
            })
        );
        assert!(panel.entities().is_empty());
    }

    #[test]
    fn buildings_progress_cycles_every_four_ticks() {
        let mut panel = panel(PanelKind::Buildings);
        for _ in 0..9 {
            send(&mut panel, Event::Timer(Utc::now()));
        }
        assert_eq!(panel.cycles(), 2);
        assert_eq!(panel.progress().map(Progress::fraction), Some(0.25));
    }

    #[test]
    fn only_buildings_pay_out() {
        assert_eq!(
            ready(PanelKind::Buildings).ledger().map(|l| l.payout()),
            Some(600)
        );
        assert_eq!(ready(PanelKind::Capital).ledger(), None);
        assert!(ready(PanelKind::Capital).progress().is_none());
    }

    #[test]
    fn status_reflects_collection() {
        let mut panel = ready(PanelKind::Capital);
        assert_eq!(panel.status_value(), "Money: $6000");
        send(&mut panel, Event::Key(Key::Enter));
        assert_eq!(panel.status_value(), "Money: $6001");
        assert_eq!(panel.status_detail(), "☰ 1/3");
        assert_eq!(ready(PanelKind::Buildings).status_detail(), "☰ 1/3 ⟳ 0");
    }

    #[test]
    fn set_size_sets_progress_width() {
        let mut panel = panel(PanelKind::Buildings);
        panel.set_size(50, 20);
        assert_eq!(panel.progress().map(Progress::width), Some(42));
    }

    #[test]
    fn resize_event_leaves_size_to_the_controller() {
        let mut panel = ready(PanelKind::Capital);
        panel.set_size(80, 4);
        send(
            &mut panel,
            Event::Resize {
                width: 80,
                height: 40,
            },
        );
        assert_eq!(panel.view().rows.len(), 1);
    }

    #[test]
    fn short_body_scrolls_to_selection() {
        let mut panel = ready(PanelKind::Weapons);
        panel.set_size(80, 6);
        assert_eq!(panel.view().rows.len(), 2);
        send(&mut panel, Event::Key(Key::Down));
        send(&mut panel, Event::Key(Key::Down));
        let view = panel.view();
        assert_eq!(view.rows[0].title, "Weapon 2");
        assert_eq!(view.rows[1].title, "Weapon 3");
        assert_eq!(view.selected, Some(1));
    }
}
