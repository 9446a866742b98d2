use super::*;

fn mono(s: &str) -> f32 {
    s.chars().count() as f32 * 10.0
}

#[test]
fn wraps_at_last_word_that_fits() {
    let lines = wrap_lines("the quick brown fox", 100.0, mono);
    assert_eq!(lines, vec!["the quick", "brown fox"]);
}

#[test]
fn keeps_explicit_newlines_and_empty_paragraphs() {
    let lines = wrap_lines("a b\n\nc", 1000.0, mono);
    assert_eq!(lines, vec!["a b", "", "c"]);
}

#[test]
fn overlong_word_gets_its_own_line() {
    let lines = wrap_lines("hi extraordinarily ok", 50.0, mono);
    assert_eq!(lines, vec!["hi", "extraordinarily", "ok"]);
}

#[test]
fn collapses_repeated_spaces() {
    assert_eq!(wrap_lines("a   b", 1000.0, mono), vec!["a b"]);
}

#[test]
fn exact_fit_stays_on_line() {
    // "ab cd" is 50 wide.
    assert_eq!(wrap_lines("ab cd", 50.0, mono), vec!["ab cd"]);
}

#[test]
fn alignment_offsets() {
    assert_eq!(align_offset(TextAlign::Left, 100.0, 40.0), 0.0);
    assert_eq!(align_offset(TextAlign::Center, 100.0, 40.0), 30.0);
    assert_eq!(align_offset(TextAlign::Right, 100.0, 40.0), 60.0);
}

#[test]
fn layout_rejects_bad_size() {
    let mut engine = TextEngine::new();
    let style = TextContent::default();
    assert!(engine.layout_line("x", &style, 0.0, TextBrush::default()).is_err());
    assert!(engine.layout_line("x", &style, f32::NAN, TextBrush::default()).is_err());
}
