// Copyright (c) 2026 rezky_nightky

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

/// Lines moved per wheel notch.
pub const WHEEL_LINES: usize = 3;
/// Lines moved per PageUp/PageDown.
pub const PAGE_LINES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter,
    HistoryUp,
    HistoryDown,
    ScrollUp(usize),
    ScrollDown(usize),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyInput),
    Resize(u16, u16),
    Focus(bool),
}

pub fn map_event(ev: Event) -> Option<InputEvent> {
    match ev {
        Event::Key(k) => map_key(k).map(InputEvent::Key),
        Event::Mouse(m) => map_mouse(m).map(InputEvent::Key),
        Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        Event::FocusGained => Some(InputEvent::Focus(true)),
        Event::FocusLost => Some(InputEvent::Focus(false)),
        _ => None,
    }
}

fn map_key(k: KeyEvent) -> Option<KeyInput> {
    if k.kind == KeyEventKind::Release {
        return None;
    }
    let key = match (k.code, k.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyInput::Quit,
        (KeyCode::Char(_), m) if m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            return None
        }
        (KeyCode::Char(c), _) => KeyInput::Char(c),
        (KeyCode::Backspace, _) => KeyInput::Backspace,
        (KeyCode::Enter, _) => KeyInput::Enter,
        (KeyCode::Up, _) => KeyInput::HistoryUp,
        (KeyCode::Down, _) => KeyInput::HistoryDown,
        (KeyCode::PageUp, _) => KeyInput::ScrollUp(PAGE_LINES),
        (KeyCode::PageDown, _) => KeyInput::ScrollDown(PAGE_LINES),
        _ => return None,
    };
    Some(key)
}

fn map_mouse(m: MouseEvent) -> Option<KeyInput> {
    match m.kind {
        MouseEventKind::ScrollUp => Some(KeyInput::ScrollUp(WHEEL_LINES)),
        MouseEventKind::ScrollDown => Some(KeyInput::ScrollDown(WHEEL_LINES)),
        _ => None,
    }
}
