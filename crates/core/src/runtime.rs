//! Cooperative scheduling of deferred commands.
//!
//! Every command returned by the controller lands in one [`Scheduler`]:
//! immediate work goes to a FIFO of ready tasks, delayed work waits on a
//! monotonic clock measured from start-up. [`Runtime`] drains the FIFO one
//! task at a time, so no two events are ever handled concurrently. The clock
//! is supplied by the caller, which lets the terminal frontend use real time
//! and tests use a virtual one.

use std::{collections::VecDeque, time::Duration};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    controller::Controller,
    event::{Command, Event, SpinnerId},
    models::PanelKind,
};

/// Immediate work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Dispatch an event.
    Event(Event),
    /// Run the load routine of a panel kind.
    Load(PanelKind),
}

/// What a delayed entry turns into when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fire {
    /// The game timer.
    Timer,
    /// A spinner frame for this id.
    Spinner(SpinnerId),
}

#[derive(Debug)]
struct Timed {
    due: Duration,
    seq: u64,
    fire: Fire,
}

/// Ready queue plus delayed entries ordered by due time, then by submission.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    ready: VecDeque<Task>,
    timed: Vec<Timed>,
    seq: u64,
}

impl Scheduler {
    /// Empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time on the scheduler's clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queue `cmds`. Returns `true` when one of them asks to quit.
    pub fn schedule(&mut self, cmds: Vec<Command>) -> bool {
        let mut quit = false;
        for cmd in cmds {
            match cmd {
                Command::Quit => quit = true,
                Command::Emit(event) => self.ready.push_back(Task::Event(event)),
                Command::Load(kind) => self.ready.push_back(Task::Load(kind)),
                Command::Timer(after) => self.delay(after, Fire::Timer),
                Command::Spinner { id, after } => self.delay(after, Fire::Spinner(id)),
            }
        }
        quit
    }

    fn delay(&mut self, after: Duration, fire: Fire) {
        self.seq += 1;
        self.timed.push(Timed {
            due: self.now + after,
            seq: self.seq,
            fire,
        });
    }

    /// Queue an event behind the ready work.
    pub fn push(&mut self, event: Event) {
        self.ready.push_back(Task::Event(event));
    }

    /// Next ready task in FIFO order.
    pub fn pop_ready(&mut self) -> Option<Task> {
        self.ready.pop_front()
    }

    /// Number of delayed entries still waiting.
    pub fn pending(&self) -> usize {
        self.timed.len()
    }

    /// Count of pending entries that fire `fire`.
    pub fn pending_of(&self, fire: Fire) -> usize {
        self.timed.iter().filter(|timed| timed.fire == fire).count()
    }

    /// Earliest due time among delayed entries.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timed.iter().map(|timed| timed.due).min()
    }

    /// Take the earliest entry due at or before `now`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, Fire)> {
        let (index, _) = self
            .timed
            .iter()
            .enumerate()
            .filter(|(_, timed)| timed.due <= now)
            .min_by_key(|(_, timed)| (timed.due, timed.seq))?;
        let timed = self.timed.swap_remove(index);
        self.now = self.now.max(timed.due);
        Some((timed.due, timed.fire))
    }

    /// Move the clock forward to `now`; it never goes back.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

/// A controller driven by a scheduler.
#[derive(Debug)]
pub struct Runtime {
    controller: Controller,
    scheduler: Scheduler,
    started_at: DateTime<Utc>,
    quit: bool,
}

impl Runtime {
    /// Runtime around `controller`, with the clock at zero.
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            scheduler: Scheduler::new(),
            started_at: Utc::now(),
            quit: false,
        }
    }

    /// Initialise the controller and process its start-up work.
    pub fn start(&mut self) {
        let cmds = self.controller.initialize();
        self.submit(cmds);
        self.pump();
    }

    /// Queue an event at the current clock time.
    pub fn push(&mut self, event: Event) {
        self.scheduler.push(event);
    }

    /// Queue an external event that arrived at `now`. Entries due by then
    /// fire first, so work the event schedules is timed from `now`.
    pub fn receive(&mut self, event: Event, now: Duration) {
        self.advance(now);
        self.scheduler.push(event);
    }

    /// Handle ready tasks until none are left. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while !self.quit {
            let Some(task) = self.scheduler.pop_ready() else {
                break;
            };
            self.run(task);
            handled += 1;
        }
        handled
    }

    /// Fire every delayed entry due by `now`, in order, handling the work
    /// each one triggers before firing the next.
    pub fn advance(&mut self, now: Duration) {
        while !self.quit {
            let Some((due, fire)) = self.scheduler.pop_due(now) else {
                break;
            };
            let event = match fire {
                Fire::Timer => Event::Timer(self.wall_clock(due)),
                Fire::Spinner(id) => Event::SpinnerTick(id),
            };
            self.scheduler.push(event);
            self.pump();
        }
        self.scheduler.set_now(now);
    }

    /// Earliest time [`Runtime::advance`] has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// `true` once a quit command was handled.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The driven controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The scheduler holding pending work.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::Event(event) => {
                let cmds = self.controller.dispatch(event);
                self.submit(cmds);
            }
            Task::Load(kind) => {
                debug!(%kind, "Running load");
                if let Some(event) = self.controller.load(kind) {
                    self.scheduler.push(event);
                }
            }
        }
    }

    fn submit(&mut self, cmds: Vec<Command>) {
        if self.scheduler.schedule(cmds) {
            info!("Stopping event loop");
            self.quit = true;
        }
    }

    fn wall_clock(&self, at: Duration) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(at).unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, controller::GlobalState, event::Key};

    fn runtime() -> Runtime {
        let mut runtime = Runtime::new(Controller::new(AppConfig::default()));
        runtime.start();
        runtime
    }

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn start_reaches_ready_without_time_passing() {
        let runtime = runtime();
        assert_eq!(runtime.controller().state(), GlobalState::Ready);
        assert_eq!(runtime.scheduler().now(), Duration::ZERO);
    }

    #[test]
    fn one_payout_cycle_every_ten_ticks() {
        let mut runtime = runtime();
        runtime.advance(secs(18));
        assert_eq!(runtime.controller().resources(), 0);
        runtime.advance(secs(20));
        assert_eq!(runtime.controller().resources(), 600);
        runtime.advance(secs(40));
        assert_eq!(runtime.controller().resources(), 1200);
    }

    #[test]
    fn upgrade_mid_cycle_changes_payout() {
        let mut runtime = runtime();
        runtime.advance(secs(10));
        runtime.push(Event::Key(Key::Enter));
        runtime.pump();
        runtime.advance(secs(20));
        assert_eq!(runtime.controller().resources(), 700);
    }

    #[test]
    fn exactly_one_timer_chain() {
        let mut runtime = runtime();
        for step in 1..=30 {
            runtime.advance(Duration::from_millis(step * 700));
            assert_eq!(runtime.scheduler().pending_of(Fire::Timer), 1);
        }
    }

    #[test]
    fn spinners_stop_once_ready() {
        let mut runtime = runtime();
        runtime.advance(secs(1));
        assert_eq!(runtime.scheduler().pending(), 1);
        assert_eq!(runtime.next_deadline(), Some(secs(2)));
    }

    #[test]
    fn background_tab_loads_when_activated() {
        let mut runtime = runtime();
        runtime.push(Event::Key(Key::NextTab));
        runtime.pump();
        let controller = runtime.controller();
        assert_eq!(controller.active_index(), 1);
        assert!(!controller.active_panel().is_loading());
    }

    #[test]
    fn quit_stops_processing() {
        let mut runtime = runtime();
        runtime.push(Event::Key(Key::Quit));
        runtime.push(Event::Key(Key::NextTab));
        runtime.pump();
        assert!(runtime.should_quit());
        assert_eq!(runtime.controller().active_index(), 0);
    }

    #[test]
    fn input_schedules_from_its_arrival_time() {
        let mut runtime = runtime();
        runtime.receive(Event::Key(Key::NextTab), secs(5));
        runtime.pump();
        assert_eq!(runtime.scheduler().now(), secs(5));
        // Capital's first spinner frame, not the timer at 6 s.
        assert_eq!(runtime.next_deadline(), Some(Duration::from_millis(5100)));
    }

    #[test]
    fn due_entries_fire_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(vec![
            Command::Timer(secs(2)),
            Command::Spinner {
                id: 9,
                after: secs(1),
            },
            Command::Timer(secs(1)),
        ]);
        assert_eq!(
            scheduler.pop_due(secs(5)),
            Some((secs(1), Fire::Spinner(9)))
        );
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(1), Fire::Timer)));
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(2), Fire::Timer)));
        assert_eq!(scheduler.pop_due(secs(5)), None);
        assert_eq!(scheduler.now(), secs(2));
    }
}
