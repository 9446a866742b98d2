use crate::composer::command::Command;
use crate::edit::interaction::Modifiers;
use crate::view::viewport::ToolMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable key, compared case-insensitively.
    Char(char),
    Delete,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// Focus is inside a text-editing control.
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            in_text_input: false,
        }
    }
}

/// Map a key press to its command. Nothing is dispatched while a text field has focus.
pub fn shortcut_for(event: &KeyEvent, nudge_step: f64, nudge_step_large: f64) -> Option<Command> {
    if event.in_text_input {
        return None;
    }
    let m = event.modifiers;
    let step = if m.shift { nudge_step_large } else { nudge_step };

    let cmd = match event.key {
        Key::Delete | Key::Backspace => Command::DeleteSelection,
        Key::Escape => Command::DeselectAll,
        Key::ArrowUp => Command::Nudge { dx: 0.0, dy: -step },
        Key::ArrowDown => Command::Nudge { dx: 0.0, dy: step },
        Key::ArrowLeft => Command::Nudge { dx: -step, dy: 0.0 },
        Key::ArrowRight => Command::Nudge { dx: step, dy: 0.0 },
        Key::Char(c) => match (c.to_ascii_lowercase(), m.ctrl) {
            ('z', true) if m.shift => Command::Redo,
            ('z', true) => Command::Undo,
            ('y', true) => Command::Redo,
            ('d', true) => Command::DuplicateSelection,
            ('a', true) => Command::SelectAll,
            ('e', true) => Command::ExportSelection,
            (']', true) => Command::BringToFront,
            ('[', true) => Command::SendToBack,
            (']', false) => Command::RaiseSelection,
            ('[', false) => Command::LowerSelection,
            ('v', false) => Command::SetTool(ToolMode::Select),
            ('h', false) => Command::SetTool(ToolMode::Hand),
            _ => return None,
        },
    };
    Some(cmd)
}

#[cfg(test)]
#[path = "../../tests/unit/view/keys.rs"]
mod tests;
