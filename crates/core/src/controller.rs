//! The controller owns every panel and routes each event to them.

use tracing::{debug, info, warn};

use crate::{
    config::{AppConfig, ReadyPolicy},
    error::GameError,
    event::{Command, Event, Key},
    layout::Layout,
    models::{starter_entities, Entity, GameInfo, PanelKind},
    panel::{
        CollectionPanel, Descriptor, KeyBinding, Ledger, OverviewPanel, Panel, PanelContext,
    },
    spinner::{Spinner, SpinnerIds},
    status::StatusLine,
};

/// Lifecycle of the game as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalState {
    /// Waiting for panels to load; the body shows the global spinner.
    Loading,
    /// The active panel is drawn with the status line.
    Ready,
}

const COMMON_HELP: [KeyBinding; 4] = [
    KeyBinding::new("esc", "back"),
    KeyBinding::new("tab", "switch tab"),
    KeyBinding::new("?", "help"),
    KeyBinding::new("q", "quit"),
];

/// Builds panels with spinner ids drawn from the controller's allocator.
#[derive(Debug)]
pub struct PanelFactory<'a> {
    ids: &'a mut SpinnerIds,
    config: &'a AppConfig,
}

impl PanelFactory<'_> {
    fn spinner(&mut self) -> Spinner {
        Spinner::new(self.ids.next_id(), self.config.timing.spinner_interval())
    }

    /// A collection panel; `None` leaves its collection missing.
    pub fn collection(&mut self, kind: PanelKind, entities: Option<Vec<Entity>>) -> Box<dyn Panel> {
        let spinner = self.spinner();
        Box::new(CollectionPanel::new(
            Descriptor::for_kind(kind),
            entities,
            spinner,
            &self.config.timing,
            self.config.layout,
        ))
    }

    /// A collection panel seeded with its starter set.
    pub fn starter(&mut self, kind: PanelKind) -> Box<dyn Panel> {
        self.collection(kind, Some(starter_entities(kind)))
    }

    /// The overview panel.
    pub fn overview(&mut self) -> Box<dyn Panel> {
        let spinner = self.spinner();
        Box::new(OverviewPanel::new(
            spinner,
            &self.config.timing,
            self.config.layout,
        ))
    }
}

/// Root of the game: panels, active tab, global lifecycle, resource total.
#[derive(Debug)]
pub struct Controller {
    config: AppConfig,
    game: GameInfo,
    panels: Vec<Box<dyn Panel>>,
    initialized: Vec<bool>,
    active: usize,
    state: GlobalState,
    resources: u64,
    spinner: Spinner,
    status: StatusLine,
    layout: Layout,
    show_full_help: bool,
}

impl Controller {
    /// Controller with the standard tabs: Buildings, Capital, Weapons and
    /// Overview.
    pub fn new(config: AppConfig) -> Self {
        let mut ids = SpinnerIds::default();
        let spinner = Spinner::new(ids.next_id(), config.timing.spinner_interval());
        let panels = {
            let mut factory = PanelFactory {
                ids: &mut ids,
                config: &config,
            };
            vec![
                factory.starter(PanelKind::Buildings),
                factory.starter(PanelKind::Capital),
                factory.starter(PanelKind::Weapons),
                factory.overview(),
            ]
        };
        Self::assemble(config, spinner, panels)
    }

    /// Controller over a custom panel set, in tab order.
    pub fn with_panels<F>(config: AppConfig, build: F) -> Result<Self, GameError>
    where
        F: FnOnce(&mut PanelFactory<'_>) -> Vec<Box<dyn Panel>>,
    {
        let mut ids = SpinnerIds::default();
        let spinner = Spinner::new(ids.next_id(), config.timing.spinner_interval());
        let panels = build(&mut PanelFactory {
            ids: &mut ids,
            config: &config,
        });
        if panels.is_empty() {
            return Err(GameError::NoPanels);
        }
        Ok(Self::assemble(config, spinner, panels))
    }

    fn assemble(config: AppConfig, spinner: Spinner, panels: Vec<Box<dyn Panel>>) -> Self {
        info!(
            tabs = ?panels.iter().map(|panel| panel.tab_name()).collect::<Vec<_>>(),
            "Controller created"
        );
        Self {
            game: config.game.clone(),
            initialized: vec![false; panels.len()],
            panels,
            active: 0,
            state: GlobalState::Loading,
            resources: 0,
            spinner,
            status: StatusLine::new(),
            layout: Layout::default(),
            show_full_help: false,
            config,
        }
    }

    /// Startup commands: tab strip, status line, panel loading, spinner and
    /// the first timer.
    pub fn initialize(&mut self) -> Vec<Command> {
        self.state = GlobalState::Loading;
        self.active = 0;
        self.status.init();

        let mut cmds = vec![Command::Emit(Event::TabActivated(0))];
        match self.config.ready_policy {
            ReadyPolicy::FirstPanel => cmds.extend(self.ensure_initialized(0)),
            ReadyPolicy::AllPanels => {
                for index in 0..self.panels.len() {
                    cmds.extend(self.ensure_initialized(index));
                }
            }
        }
        cmds.push(self.spinner.tick());
        cmds.push(Command::Timer(self.config.timing.tick_interval()));
        cmds
    }

    /// Route one event and collect the follow-up commands.
    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        debug!(?event, "Dispatch");
        let ledger = self.ledger();
        let mut ctx = PanelContext::new(&ledger, self.resources);
        let mut cmds = Vec::new();
        // Set once the active panel has seen the event through a broadcast
        // or a targeted delivery.
        let mut reached_active = false;

        match &event {
            Event::Key(key) => match key {
                Key::Quit => {
                    info!("Quit requested");
                    return vec![Command::Quit];
                }
                Key::Back => cmds.push(Command::Emit(Event::GoBack)),
                Key::NextTab => cmds.push(Command::Emit(Event::SelectTab(
                    self.active.saturating_add(1),
                ))),
                Key::PrevTab => cmds.push(Command::Emit(Event::SelectTab(
                    self.active.saturating_sub(1),
                ))),
                Key::Tab(index) => cmds.push(Command::Emit(Event::SelectTab(*index))),
                Key::Help => self.show_full_help = !self.show_full_help,
                Key::Enter | Key::Up | Key::Down | Key::Char(_) => {}
            },
            Event::Resize { width, height } => {
                self.set_size(*width, *height);
                cmds.extend(self.broadcast(&event, &mut ctx));
                reached_active = true;
            }
            Event::SelectTab(index) => {
                let index = self.clamp_index(*index);
                self.active = index;
                cmds.extend(self.ensure_initialized(index));
                cmds.push(Command::Emit(Event::TabActivated(index)));
            }
            Event::TabActivated(index) => {
                let index = self.clamp_index(*index);
                self.active = index;
                cmds.extend(self.ensure_initialized(index));
            }
            Event::SwitchTab(kind) => {
                match self.panels.iter().position(|panel| panel.kind() == *kind) {
                    Some(index) => cmds.push(Command::Emit(Event::SelectTab(index))),
                    None => warn!(%kind, "No tab for requested panel"),
                }
            }
            Event::PanelReady(snapshot) => {
                let kind = snapshot.kind;
                for index in self.indices_of(kind) {
                    cmds.extend(self.panels[index].update(&event, &mut ctx));
                    reached_active |= index == self.active;
                }
                self.refresh_state();
            }
            Event::Error(err) => {
                warn!(%err, "Panel failed to load; continuing without it");
                self.mark_ready();
            }
            Event::SpinnerTick(id) => {
                if self.state == GlobalState::Loading && *id == self.spinner.id() {
                    cmds.extend(self.spinner.update(*id));
                } else if let Some(index) = self
                    .panels
                    .iter()
                    .position(|panel| panel.spinner_id() == *id)
                {
                    if index != self.active {
                        cmds.extend(self.panels[index].update(&event, &mut ctx));
                    }
                }
            }
            Event::Timer(at) => {
                debug!(%at, "Timer");
                cmds.push(Command::Timer(self.config.timing.tick_interval()));
                cmds.extend(self.broadcast(&event, &mut ctx));
                reached_active = true;
            }
            Event::Game(info) => {
                self.game = info.clone();
                cmds.extend(self.broadcast(&event, &mut ctx));
                reached_active = true;
            }
            Event::ItemActive { .. } | Event::GoBack => {}
            Event::Unhandled(what) => {
                debug!(what = %what, "Ignoring unhandled event");
            }
        }

        if !reached_active {
            cmds.extend(self.panels[self.active].update(&event, &mut ctx));
        }

        let payout = ctx.payout();
        if payout > 0 {
            self.resources = self.resources.saturating_add(payout);
            info!(payout, total = self.resources, "Resources increased");
        }

        if event.refreshes_status() {
            self.sync_status();
        }
        self.status.update(&event);
        cmds
    }

    /// Run the load routine of the panel showing `kind`.
    pub fn load(&self, kind: PanelKind) -> Option<Event> {
        let panel = self.panels.iter().find(|panel| panel.kind() == kind);
        if panel.is_none() {
            warn!(%kind, "Load requested for unknown panel");
        }
        panel.map(|panel| panel.load())
    }

    /// Recompute the layout and resize every panel.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.layout = Layout::compute(&self.config.layout, width, height);
        for panel in &mut self.panels {
            panel.set_size(width, self.layout.body_height);
        }
    }

    /// Global lifecycle state.
    pub fn state(&self) -> GlobalState {
        self.state
    }

    /// Index of the active tab, always within bounds.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Panel of the active tab.
    pub fn active_panel(&self) -> &dyn Panel {
        self.panels[self.active].as_ref()
    }

    /// Every panel in tab order.
    pub fn panels(&self) -> &[Box<dyn Panel>] {
        &self.panels
    }

    /// Tab labels in tab order.
    pub fn tab_names(&self) -> Vec<&'static str> {
        self.panels.iter().map(|panel| panel.tab_name()).collect()
    }

    /// Cumulative resource total.
    pub fn resources(&self) -> u64 {
        self.resources
    }

    /// Header metadata.
    pub fn game(&self) -> &GameInfo {
        &self.game
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Geometry from the last resize.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Status line state.
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Global loading spinner.
    pub fn spinner(&self) -> &Spinner {
        &self.spinner
    }

    /// Whether the footer shows grouped help instead of one line.
    pub fn show_full_help(&self) -> bool {
        self.show_full_help
    }

    /// Display path of the active panel.
    pub fn path(&self) -> &'static str {
        self.active_panel().path()
    }

    /// Common bindings followed by the active panel's one-line help.
    pub fn short_help(&self) -> Vec<KeyBinding> {
        let mut bindings = COMMON_HELP.to_vec();
        bindings.extend(self.active_panel().short_help());
        bindings
    }

    /// Common bindings followed by the active panel's grouped help.
    pub fn full_help(&self) -> Vec<Vec<KeyBinding>> {
        let mut groups = vec![COMMON_HELP.to_vec()];
        groups.extend(self.active_panel().full_help());
        groups
    }

    /// Whole frame as text: header, tab strip, body and status line.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();
        if !self.game.project_name.is_empty() {
            let mut header = self.game.display_name().to_string();
            let description = self.game.description.trim();
            if !description.is_empty() {
                header.push('\n');
                header.push_str(description);
            }
            sections.push(header);
        }
        sections.push(self.render_tabs());
        match self.state {
            GlobalState::Loading => {
                sections.push(format!("{}loading…", self.spinner.view()));
            }
            GlobalState::Ready => {
                sections.push(self.active_panel().render());
                sections.push(self.status.render());
            }
        }
        sections.join("\n\n")
    }

    fn render_tabs(&self) -> String {
        self.panels
            .iter()
            .enumerate()
            .map(|(index, panel)| {
                if index == self.active {
                    format!("[{}]", panel.tab_name())
                } else {
                    format!(" {} ", panel.tab_name())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn ledger(&self) -> Ledger {
        let mut ledger = Ledger::default();
        for panel in &self.panels {
            if let Some(stakes) = panel.ledger() {
                ledger.extend(stakes);
            }
        }
        ledger
    }

    fn broadcast(&mut self, event: &Event, ctx: &mut PanelContext<'_>) -> Vec<Command> {
        let mut cmds = Vec::new();
        for panel in &mut self.panels {
            cmds.extend(panel.update(event, ctx));
        }
        cmds
    }

    fn indices_of(&self, kind: PanelKind) -> Vec<usize> {
        self.panels
            .iter()
            .enumerate()
            .filter(|(_, panel)| panel.kind() == kind)
            .map(|(index, _)| index)
            .collect()
    }

    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.panels.len() - 1)
    }

    fn ensure_initialized(&mut self, index: usize) -> Vec<Command> {
        if self.initialized[index] {
            return Vec::new();
        }
        self.initialized[index] = true;
        self.panels[index].init()
    }

    fn refresh_state(&mut self) {
        if self.state == GlobalState::Ready {
            return;
        }
        let ready = match self.config.ready_policy {
            ReadyPolicy::FirstPanel => self.panels.iter().any(|panel| !panel.is_loading()),
            ReadyPolicy::AllPanels => self.panels.iter().all(|panel| !panel.is_loading()),
        };
        if ready {
            self.mark_ready();
        }
    }

    fn mark_ready(&mut self) {
        if self.state != GlobalState::Ready {
            self.state = GlobalState::Ready;
            info!("Game ready");
        }
    }

    fn sync_status(&mut self) {
        let panel = self.panels[self.active].as_ref();
        self.status.sync(&self.game.name, panel);
    }
}
