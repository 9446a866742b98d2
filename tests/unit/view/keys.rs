use super::*;

fn press(key: Key, modifiers: Modifiers) -> Option<Command> {
    shortcut_for(&KeyEvent::new(key, modifiers), 1.0, 10.0)
}

#[test]
fn maps_core_shortcuts() {
    assert_eq!(press(Key::Char('z'), Modifiers::ctrl()), Some(Command::Undo));
    assert_eq!(
        press(Key::Char('Z'), Modifiers { shift: true, ..Modifiers::ctrl() }),
        Some(Command::Redo)
    );
    assert_eq!(press(Key::Char('y'), Modifiers::ctrl()), Some(Command::Redo));
    assert_eq!(press(Key::Delete, Modifiers::NONE), Some(Command::DeleteSelection));
    assert_eq!(press(Key::Backspace, Modifiers::NONE), Some(Command::DeleteSelection));
    assert_eq!(press(Key::Char('d'), Modifiers::ctrl()), Some(Command::DuplicateSelection));
    assert_eq!(press(Key::Char(']'), Modifiers::NONE), Some(Command::RaiseSelection));
    assert_eq!(press(Key::Char('['), Modifiers::NONE), Some(Command::LowerSelection));
    assert_eq!(press(Key::Escape, Modifiers::NONE), Some(Command::DeselectAll));
    assert_eq!(press(Key::Char('e'), Modifiers::ctrl()), Some(Command::ExportSelection));
    assert_eq!(press(Key::Char('h'), Modifiers::NONE), Some(Command::SetTool(ToolMode::Hand)));
    assert_eq!(press(Key::Char('v'), Modifiers::NONE), Some(Command::SetTool(ToolMode::Select)));
}

#[test]
fn arrows_nudge_with_large_step_on_shift() {
    assert_eq!(press(Key::ArrowLeft, Modifiers::NONE), Some(Command::Nudge { dx: -1.0, dy: 0.0 }));
    assert_eq!(press(Key::ArrowDown, Modifiers::shift()), Some(Command::Nudge { dx: 0.0, dy: 10.0 }));
}

#[test]
fn text_input_focus_suppresses_everything() {
    let mut ev = KeyEvent::new(Key::Delete, Modifiers::NONE);
    ev.in_text_input = true;
    assert_eq!(shortcut_for(&ev, 1.0, 10.0), None);
}

#[test]
fn unmapped_keys_do_nothing() {
    assert_eq!(press(Key::Char('q'), Modifiers::NONE), None);
    assert_eq!(press(Key::Char('v'), Modifiers::ctrl()), None);
}
