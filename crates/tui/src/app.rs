use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use clicktui_core::{
    panel::{KeyBinding, PanelView},
    Controller, Event, GlobalState, Runtime,
};
use crossterm::{
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tracing::{error, info};

use crate::{input, theme::Theme};

const INPUT_POLL: Duration = Duration::from_millis(250);

pub struct ClickApp {
    runtime: Runtime,
    theme: Theme,
}

impl ClickApp {
    pub fn new(controller: Controller, theme: Theme) -> Self {
        Self {
            runtime: Runtime::new(controller),
            theme,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(128);
        spawn_input_thread(event_tx);

        let result = self.drive(&mut terminal, &mut event_rx).await;
        restore_terminal(&mut terminal)?;
        result
    }

    /// Pump the runtime, redraw, then wait for input or the next deadline,
    /// whichever comes first.
    async fn drive<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut mpsc::Receiver<Event>,
    ) -> Result<()> {
        let size = terminal.size()?;
        self.runtime.start();
        self.runtime.push(Event::Resize {
            width: size.width,
            height: size.height,
        });
        let clock = Instant::now();

        loop {
            self.runtime.pump();
            if self.runtime.should_quit() {
                break;
            }
            terminal.draw(|frame| self.draw(frame))?;

            let deadline = self.runtime.next_deadline().map(|after| clock + after);
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.runtime.receive(event, clock.elapsed()),
                    None => {
                        info!("Input channel closed");
                        break;
                    }
                },
                _ = wait_until(deadline) => self.runtime.advance(clock.elapsed()),
            }
        }
        Ok(())
    }

    fn controller(&self) -> &Controller {
        self.runtime.controller()
    }

    fn draw(&self, frame: &mut Frame) {
        let controller = self.controller();
        let layout = controller.config().layout;
        let area = frame.size();
        let show_header = !controller.game().project_name.is_empty();
        let help = self.help_lines();

        let mut constraints = Vec::new();
        if show_header {
            constraints.push(Constraint::Length(layout.header_height));
        }
        constraints.push(Constraint::Length(layout.tab_height));
        constraints.push(Constraint::Min(3));
        constraints.push(Constraint::Length(layout.status_height));
        constraints.push(Constraint::Length(help.len() as u16));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let mut regions = chunks.iter().copied();
        if show_header {
            if let Some(header) = regions.next() {
                self.render_header(frame, header);
            }
        }
        let tabs = regions.next().unwrap_or(area);
        let body = regions.next().unwrap_or(area);
        let status = regions.next().unwrap_or(area);
        let help_area = regions.next().unwrap_or(area);

        self.render_tabs(frame, tabs);
        match controller.state() {
            GlobalState::Loading => {
                let text = format!("{}loading…", controller.spinner().view());
                frame.render_widget(
                    Paragraph::new(text).style(Style::default().fg(self.theme.muted)),
                    body,
                );
            }
            GlobalState::Ready => {
                self.render_panel(frame, body, &controller.active_panel().view());
                self.render_status(frame, status);
            }
        }
        frame.render_widget(Paragraph::new(help), help_area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let game = self.controller().game();
        let mut lines = vec![Line::from(Span::styled(
            game.display_name().to_string(),
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        ))];
        let description = game.description.trim();
        if !description.is_empty() {
            lines.push(Line::from(Span::styled(
                description.to_string(),
                Style::default().fg(self.theme.muted),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let controller = self.controller();
        let tabs = Tabs::new(controller.tab_names())
            .select(controller.active_index())
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("│");
        frame.render_widget(tabs, area);
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect, view: &PanelView) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.muted))
            .title(view.title.clone());
        if let Some(spinner) = view.loading {
            let paragraph = Paragraph::new(format!("{spinner}loading…")).block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = Vec::new();
        if !view.rows.is_empty() {
            constraints.push(Constraint::Min(1));
        }
        if !view.lines.is_empty() {
            constraints.push(Constraint::Length(view.lines.len() as u16));
        }
        if view.progress.is_some() {
            constraints.push(Constraint::Length(2));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);
        let mut regions = chunks.iter().copied();

        if !view.rows.is_empty() {
            let items: Vec<ListItem> = view
                .rows
                .iter()
                .map(|row| {
                    ListItem::new(vec![
                        Line::from(Span::styled(
                            row.title.clone(),
                            Style::default()
                                .fg(self.theme.primary_fg)
                                .add_modifier(Modifier::BOLD),
                        )),
                        Line::from(Span::styled(
                            row.description.clone(),
                            Style::default().fg(self.theme.muted),
                        )),
                    ])
                })
                .collect();
            let mut list_state = ListState::default();
            list_state.select(view.selected);
            let list = List::new(items)
                .highlight_style(Style::default().fg(self.theme.highlight))
                .highlight_symbol("▶ ");
            frame.render_stateful_widget(list, regions.next().unwrap_or(inner), &mut list_state);
        }

        if !view.lines.is_empty() {
            let lines: Vec<Line> = view.lines.iter().map(|line| Line::from(line.clone())).collect();
            frame.render_widget(Paragraph::new(lines), regions.next().unwrap_or(inner));
        }

        if let Some(progress) = &view.progress {
            let mut bar = regions.next().unwrap_or(inner);
            bar.y = bar.y.saturating_add(1);
            bar.height = 1;
            if progress.width() > 0 {
                bar.width = bar.width.min(progress.width());
            }
            let ratio = progress.fraction().clamp(0.0, 1.0);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(self.theme.accent).bg(Color::Reset))
                .ratio(ratio)
                .label(format!("{:.0}%", ratio * 100.0));
            frame.render_widget(gauge, bar);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = self.controller().status();
        let snapshot = status.snapshot();
        let mut spans = vec![
            Span::styled(
                format!(" {} ", snapshot.title),
                Style::default()
                    .fg(self.theme.on_accent)
                    .bg(self.theme.accent),
            ),
            Span::raw(format!(" {} ", snapshot.value)),
            Span::styled(
                format!("{} ", snapshot.detail),
                Style::default().fg(self.theme.muted),
            ),
            Span::styled(
                format!("{} {}", snapshot.marker, status.pulse()),
                Style::default().fg(self.theme.highlight),
            ),
        ];
        if let Some(at) = status.last_tick() {
            spans.push(Span::styled(
                format!("  {}", at.with_timezone(&Local).format("%H:%M:%S")),
                Style::default().fg(self.theme.muted),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn help_lines(&self) -> Vec<Line<'static>> {
        let controller = self.controller();
        if controller.show_full_help() {
            controller
                .full_help()
                .iter()
                .map(|group| self.help_line(group))
                .collect()
        } else {
            vec![self.help_line(&controller.short_help())]
        }
    }

    fn help_line(&self, bindings: &[KeyBinding]) -> Line<'static> {
        let mut spans = Vec::new();
        for (index, binding) in bindings.iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled(" • ", Style::default().fg(self.theme.muted)));
            }
            spans.push(Span::styled(
                binding.keys,
                Style::default().fg(self.theme.accent),
            ));
            spans.push(Span::styled(
                format!(" {}", binding.help),
                Style::default().fg(self.theme.muted),
            ));
        }
        Line::from(spans)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<Event>) {
    thread::spawn(move || loop {
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(raw) => {
                    let Some(evt) = input::translate(raw) else {
                        continue;
                    };
                    if sender.blocking_send(evt).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    error!(?err, "Reading terminal input failed");
                    break;
                }
            },
            Ok(false) => {
                if sender.is_closed() {
                    break;
                }
            }
            Err(err) => {
                error!(?err, "Polling terminal input failed");
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use clicktui_core::{AppConfig, Key};
    use ratatui::backend::TestBackend;

    use super::*;

    fn app() -> ClickApp {
        ClickApp::new(Controller::new(AppConfig::default()), Theme::default())
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<Vec<_>>()
            .chunks(width)
            .map(|row| row.concat())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn drawn(app: &ClickApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        screen(&terminal)
    }

    #[test]
    fn ready_frame_shows_tabs_rows_and_status() {
        let mut app = app();
        app.runtime.start();
        app.runtime.push(Event::Resize {
            width: 80,
            height: 24,
        });
        app.runtime.pump();
        let text = drawn(&app);
        assert!(text.contains("Buildings"));
        assert!(text.contains("Overview"));
        assert!(text.contains("Building 1"));
        assert!(text.contains("Level: 1, Cost: 100"));
        assert!(text.contains("Income: 600"));
        assert!(text.contains("enter upgrade"));
    }

    #[test]
    fn help_toggle_lists_every_group() {
        let mut app = app();
        app.runtime.start();
        app.runtime.push(Event::Key(Key::Help));
        app.runtime.pump();
        let text = drawn(&app);
        assert!(text.contains("toggle help"));
    }

    #[tokio::test]
    async fn quits_after_queued_input() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(Event::Key(Key::NextTab)).await.unwrap();
        tx.send(Event::Key(Key::Quit)).await.unwrap();
        app.drive(&mut terminal, &mut rx).await.unwrap();
        assert!(app.runtime.should_quit());
        assert_eq!(app.controller().active_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_pay_out_in_virtual_time() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(21)).await;
            let _ = tx.send(Event::Key(Key::Quit)).await;
        });
        app.drive(&mut terminal, &mut rx).await.unwrap();
        assert_eq!(app.controller().resources(), 600);
    }
}
