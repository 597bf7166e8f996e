//! Translation from terminal events to game events.

use clicktui_core::{Event, Key};
use crossterm::event::{
    Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};

/// Map one terminal event. Key releases yield `None`.
pub fn translate(event: TermEvent) -> Option<Event> {
    match event {
        TermEvent::Key(key) if key.kind == KeyEventKind::Release => None,
        TermEvent::Key(key) => Some(translate_key(key)),
        TermEvent::Resize(width, height) => Some(Event::Resize { width, height }),
        TermEvent::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(Event::Key(Key::Up)),
            MouseEventKind::ScrollDown => Some(Event::Key(Key::Down)),
            _ => None,
        },
        other => Some(Event::Unhandled(format!("{other:?}"))),
    }
}

fn translate_key(key: KeyEvent) -> Event {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Event::Key(Key::Quit),
            code => Event::Unhandled(format!("ctrl+{code:?}")),
        };
    }
    let key = match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Up | KeyCode::Char('k') => Key::Up,
        KeyCode::Down | KeyCode::Char('j') => Key::Down,
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Key::NextTab,
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => Key::PrevTab,
        KeyCode::Esc | KeyCode::Backspace => Key::Back,
        KeyCode::Char('q') => Key::Quit,
        KeyCode::Char('?') => Key::Help,
        KeyCode::Char(digit @ '1'..='9') => {
            // '1' selects the first tab.
            Key::Tab(digit as usize - '1' as usize)
        }
        KeyCode::Char(ch) => Key::Char(ch),
        code => return Event::Unhandled(format!("{code:?}")),
    };
    Event::Key(key)
}
