use super::*;
use crate::edit::interaction::Handle;
use crate::edit::ops::Alignment;
use crate::view::keys::Key;

fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Layer {
    let mut l = Layer::new_image("x.png", BoundingBox::new(x, y, w, h));
    l.id = LayerId::from(id);
    l
}

/// Composer on `layers` with an identity view, so screen points are scene points.
fn composer(layers: Vec<Layer>) -> Composer {
    let doc = Document {
        canvas_settings: CanvasSettings::default(),
        layers,
    };
    let mut c =
        Composer::with_document(doc, ComposerContext::headless(), ComposerOpts::default()).unwrap();
    *c.viewport_mut() = Viewport::new(1024.0, 768.0);
    c
}

fn two_layers() -> Composer {
    composer(vec![rect("a", 0.0, 0.0, 100.0, 100.0), rect("b", 200.0, 0.0, 50.0, 50.0)])
}

fn id(s: &str) -> LayerId {
    LayerId::from(s)
}

fn drag(c: &mut Composer, from: (f64, f64), to: (f64, f64), mods: Modifiers) -> bool {
    c.pointer_down(Point::new(from.0, from.1), mods);
    c.pointer_move(Point::new(to.0, to.1), mods);
    c.pointer_up(Point::new(to.0, to.1), mods)
}

#[test]
fn drag_moves_layer_as_one_entry() {
    let mut c = two_layers();
    c.pointer_down(Point::new(50.0, 50.0), Modifiers::NONE);
    for step in 1..=5 {
        let s = f64::from(step);
        c.pointer_move(Point::new(50.0 + 2.0 * s, 50.0 + 4.0 * s), Modifiers::NONE);
    }
    assert!(c.pointer_up(Point::new(60.0, 70.0), Modifiers::NONE));

    let a = c.layer(&id("a")).unwrap();
    assert_eq!((a.x, a.y), (10.0, 20.0));
    assert_eq!(c.history().len(), 2);
    assert_eq!(c.selection().ids(), &[id("a")]);

    c.execute_sync(Command::Undo);
    let a = c.layer(&id("a")).unwrap();
    assert_eq!((a.x, a.y), (0.0, 0.0));
    c.execute_sync(Command::Redo);
    assert_eq!(c.layer(&id("a")).unwrap().x, 10.0);
}

#[test]
fn click_without_motion_records_nothing() {
    let mut c = two_layers();
    assert!(!drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::NONE));
    assert_eq!(c.history().len(), 1);
    assert_eq!(c.selection().ids(), &[id("a")]);
    assert!(c.interaction().is_none());
}

#[test]
fn drag_back_to_start_records_nothing() {
    let mut c = two_layers();
    c.pointer_down(Point::new(50.0, 50.0), Modifiers::NONE);
    c.pointer_move(Point::new(90.0, 90.0), Modifiers::NONE);
    assert!(!c.pointer_up(Point::new(50.0, 50.0), Modifiers::NONE));
    assert_eq!(c.history().len(), 1);
}

#[test]
fn click_on_empty_space_clears_unless_shift() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    drag(&mut c, (500.0, 500.0), (500.0, 500.0), Modifiers::shift());
    assert_eq!(c.selection().len(), 2);
    drag(&mut c, (500.0, 500.0), (500.0, 500.0), Modifiers::NONE);
    assert!(c.selection().is_empty());
}

#[test]
fn shift_click_toggles_membership() {
    let mut c = two_layers();
    drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::NONE);
    drag(&mut c, (220.0, 20.0), (220.0, 20.0), Modifiers::shift());
    assert_eq!(c.selection().ids(), &[id("a"), id("b")]);
    drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::shift());
    assert_eq!(c.selection().ids(), &[id("b")]);
}

#[test]
fn marquee_selects_intersecting_layers() {
    let mut c = two_layers();
    drag(&mut c, (150.0, 300.0), (300.0, 40.0), Modifiers::NONE);
    assert_eq!(c.selection().ids(), &[id("b")]);

    drag(&mut c, (150.0, 300.0), (90.0, 90.0), Modifiers::shift());
    assert_eq!(c.selection().ids(), &[id("b"), id("a")]);
    assert_eq!(c.history().len(), 1);
}

#[test]
fn marquee_replaces_selection_without_shift() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    drag(&mut c, (150.0, 300.0), (300.0, 40.0), Modifiers::NONE);
    assert_eq!(c.selection().ids(), &[id("b")]);
}

#[test]
fn alt_drag_moves_clones_and_leaves_originals() {
    let mut c = two_layers();
    assert!(drag(&mut c, (50.0, 50.0), (80.0, 50.0), Modifiers::alt()));

    let layers = c.layers();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[1].id, id("a"));
    assert_eq!((layers[1].x, layers[1].y), (0.0, 0.0));
    assert_ne!(layers[0].id, id("a"));
    assert_eq!((layers[0].x, layers[0].y), (30.0, 0.0));
    assert_eq!(c.selection().ids(), &[layers[0].id.clone()]);
    assert_eq!(c.history().len(), 2);

    c.execute_sync(Command::Undo);
    assert_eq!(c.layers().len(), 2);
    assert!(c.selection().is_empty());
}

#[test]
fn alt_click_without_motion_adds_nothing() {
    let mut c = two_layers();
    assert!(!drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::alt()));
    assert_eq!(c.layers().len(), 2);
    assert_eq!(c.history().len(), 1);
    assert_eq!(c.selection().ids(), &[id("a")]);
}

#[test]
fn alt_drag_inside_group_box_copies_selection() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    // (150, 20) is between the two layers but inside their group box.
    assert!(drag(&mut c, (150.0, 20.0), (150.0, 220.0), Modifiers::alt()));
    let layers = c.layers();
    assert_eq!(layers.len(), 4);
    assert_eq!(layers[0].y, 200.0);
    assert_eq!(layers[1].y, 200.0);
    assert_eq!(layers[2].id, id("a"));
    assert_eq!(layers[2].y, 0.0);
    assert_eq!(c.selection().len(), 2);
}

#[test]
fn locked_layer_selects_but_does_not_move() {
    let mut a = rect("a", 0.0, 0.0, 100.0, 100.0);
    a.is_locked = true;
    let mut c = composer(vec![a]);
    assert!(!drag(&mut c, (50.0, 50.0), (90.0, 90.0), Modifiers::NONE));
    assert_eq!(c.selection().ids(), &[id("a")]);
    assert_eq!(c.layer(&id("a")).unwrap().x, 0.0);
}

#[test]
fn handle_drag_resizes_from_opposite_corner() {
    let mut c = two_layers();
    drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::NONE);
    c.pointer_down(Point::new(100.0, 100.0), Modifiers::NONE);
    assert_eq!(
        c.interaction().map(|i| i.kind),
        Some(InteractionKind::Resize(Handle::BottomRight))
    );
    c.pointer_move(Point::new(150.0, 120.0), Modifiers::NONE);
    assert!(c.pointer_up(Point::new(150.0, 120.0), Modifiers::NONE));
    let a = c.layer(&id("a")).unwrap();
    assert_eq!((a.x, a.y, a.width, a.height), (0.0, 0.0, 150.0, 120.0));
}

#[test]
fn rotate_handle_rotates_about_center() {
    let mut c = two_layers();
    drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::NONE);
    // Rotate handle sits 24px above the top edge center.
    c.pointer_down(Point::new(50.0, -24.0), Modifiers::NONE);
    assert_eq!(c.interaction().map(|i| i.kind), Some(InteractionKind::Rotate));
    c.pointer_move(Point::new(150.0, 50.0), Modifiers::NONE);
    c.pointer_up(Point::new(150.0, 50.0), Modifiers::NONE);
    let a = c.layer(&id("a")).unwrap();
    assert!((a.rotation - 90.0).abs() < 1e-9);
    assert_eq!((a.x, a.y), (0.0, 0.0));
}

#[test]
fn hand_tool_pans_without_touching_scene() {
    let mut c = two_layers();
    c.execute_sync(Command::SetTool(ToolMode::Hand));
    drag(&mut c, (50.0, 50.0), (60.0, 55.0), Modifiers::NONE);
    assert_eq!(c.viewport().pan, crate::foundation::core::Vec2::new(10.0, 5.0));
    assert_eq!(c.layer(&id("a")).unwrap().x, 0.0);
    assert_eq!(c.history().len(), 1);
}

#[test]
fn space_bar_overrides_select_tool() {
    let mut c = two_layers();
    c.set_space_held(true);
    drag(&mut c, (50.0, 50.0), (70.0, 50.0), Modifiers::NONE);
    assert_eq!(c.viewport().pan.x, 20.0);
    c.set_space_held(false);
    drag(&mut c, (50.0, 50.0), (70.0, 50.0), Modifiers::NONE);
    assert_eq!(c.viewport().pan.x, 20.0);
    assert_eq!(c.layer(&id("a")).unwrap().x, 20.0);
}

#[test]
fn pointer_maps_through_zoom() {
    let mut c = two_layers();
    c.viewport_mut().scale = 2.0;
    // Screen (100, 100) is scene (50, 50), inside layer a.
    drag(&mut c, (100.0, 100.0), (120.0, 100.0), Modifiers::NONE);
    assert_eq!(c.layer(&id("a")).unwrap().x, 10.0);
}

#[test]
fn cancel_gesture_restores_scene() {
    let mut c = two_layers();
    c.pointer_down(Point::new(50.0, 50.0), Modifiers::NONE);
    c.pointer_move(Point::new(150.0, 150.0), Modifiers::NONE);
    assert_eq!(c.layer(&id("a")).unwrap().x, 100.0);
    c.cancel_gesture();
    assert_eq!(c.layer(&id("a")).unwrap().x, 0.0);
    assert_eq!(c.history().len(), 1);
}

#[test]
fn align_middle_through_commands() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    c.execute_sync(Command::Align(Alignment::Middle));
    let b = c.layer(&id("b")).unwrap();
    assert_eq!((b.x, b.y), (200.0, 25.0));
    assert_eq!(c.history().len(), 2);

    c.execute_sync(Command::Undo);
    assert_eq!(c.layer(&id("b")).unwrap().y, 0.0);
}

#[test]
fn single_selection_ops_are_ignored() {
    let mut c = two_layers();
    drag(&mut c, (50.0, 50.0), (50.0, 50.0), Modifiers::NONE);
    c.execute_sync(Command::Align(Alignment::Left));
    c.execute_sync(Command::Distribute(crate::edit::ops::Axis::Horizontal));
    assert_eq!(c.history().len(), 1);
}

#[test]
fn delete_then_undo_restores_layers_not_selection() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    c.execute_sync(Command::DeleteSelection);
    assert!(c.layers().is_empty());
    assert!(c.selection().is_empty());
    c.execute_sync(Command::Undo);
    assert_eq!(c.layers().len(), 2);
}

#[test]
fn duplicate_command_offsets_and_selects_clones() {
    let mut c = two_layers();
    drag(&mut c, (220.0, 20.0), (220.0, 20.0), Modifiers::NONE);
    c.execute_sync(Command::DuplicateSelection);
    let layers = c.layers();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[2].id, id("b"));
    let clone = c.selected_layers()[0];
    assert_eq!((clone.x, clone.y), (220.0, 20.0));
}

#[test]
fn undo_drops_vanished_ids_from_selection() {
    let mut c = two_layers();
    let new_id = c.insert_layer(rect("c", 0.0, 0.0, 10.0, 10.0)).unwrap();
    assert_eq!(c.selection().ids(), &[new_id]);
    c.execute_sync(Command::Undo);
    assert!(c.selection().is_empty());
}

#[tokio::test]
async fn arrow_keys_nudge() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    let cmd = c
        .handle_key(&KeyEvent::new(Key::ArrowRight, Modifiers::shift()))
        .await
        .unwrap();
    assert_eq!(cmd, Some(Command::Nudge { dx: 10.0, dy: 0.0 }));
    assert_eq!(c.layer(&id("a")).unwrap().x, 10.0);

    let mut typing = KeyEvent::new(Key::ArrowRight, Modifiers::NONE);
    typing.in_text_input = true;
    assert_eq!(c.handle_key(&typing).await.unwrap(), None);
    assert_eq!(c.layer(&id("a")).unwrap().x, 10.0);
}

#[test]
fn property_edits_are_single_entries() {
    let mut c = two_layers();
    assert!(c.rename_layer(&id("a"), "Sky").unwrap());
    // Already 100, so clamping 150 changes nothing and records nothing.
    assert!(!c.set_opacity(&id("a"), 150.0).unwrap());
    assert!(c.set_blend_mode(&id("a"), BlendMode::Screen).unwrap());
    assert!(c.toggle_visibility(&id("a")).unwrap());
    assert!(c.toggle_lock(&id("a")).unwrap());
    let a = c.layer(&id("a")).unwrap();
    assert_eq!(a.name, "Sky");
    assert_eq!(a.opacity, 100.0);
    assert_eq!(a.blend_mode, BlendMode::Screen);
    assert!(!a.is_visible && a.is_locked);
    assert_eq!(c.history().len(), 5);
    assert!(c.set_opacity(&id("a"), 40.0).unwrap());
    assert_eq!(c.layer(&id("a")).unwrap().opacity, 40.0);
}

#[test]
fn invalid_edits_leave_scene_untouched() {
    let mut c = two_layers();
    assert!(c.set_geometry(&id("a"), BoundingBox::new(0.0, 0.0, 0.0, 10.0), 0.0).is_err());
    assert!(c.rename_layer(&id("missing"), "x").is_err());
    assert!(c.set_text(&id("a"), |t| t.text = "hi".into()).is_err());
    assert!(c.set_opacity(&id("a"), f64::NAN).is_err());
    assert_eq!(c.history().len(), 1);
    assert_eq!(c.layer(&id("a")).unwrap().width, 100.0);
}

#[test]
fn text_layer_edits() {
    let mut c = two_layers();
    let t = c.add_text_layer("Hello", Some(Point::new(300.0, 300.0))).unwrap();
    let layer = c.layer(&t).unwrap();
    assert!(layer.is_text());
    assert!((layer.center().x - 300.0).abs() < 1e-9);
    assert!((layer.center().y - 300.0).abs() < 1e-9);
    assert_eq!(c.layers()[0].id, t);

    c.set_text(&t, |s| s.font_size = 12.0).unwrap();
    assert_eq!(c.layer(&t).unwrap().text().unwrap().font_size, 12.0);
    assert!(c.set_text(&t, |s| s.font_size = 0.0).is_err());
    assert!(c.set_text(&t, |s| s.color = "nope".into()).is_err());
    assert_eq!(c.layer(&t).unwrap().text().unwrap().color, "#ffffff");
}

#[test]
fn load_document_resets_history_and_selection() {
    let mut c = two_layers();
    c.execute_sync(Command::SelectAll);
    c.execute_sync(Command::Nudge { dx: 1.0, dy: 0.0 });
    assert_eq!(c.history().len(), 2);

    let doc = Document {
        canvas_settings: CanvasSettings::default(),
        layers: vec![rect("z", 0.0, 0.0, 5.0, 5.0)],
    };
    c.load_document(doc.clone()).unwrap();
    assert_eq!(c.history().len(), 1);
    assert!(c.selection().is_empty());
    assert_eq!(c.to_document(), doc);
}

#[test]
fn invalid_document_is_rejected_before_replacing() {
    let mut c = two_layers();
    let doc = Document {
        canvas_settings: CanvasSettings::default(),
        layers: vec![rect("z", 0.0, 0.0, 5.0, 5.0), rect("z", 1.0, 0.0, 5.0, 5.0)],
    };
    assert!(c.load_document(doc).is_err());
    assert_eq!(c.layers().len(), 2);
}

#[test]
fn history_limit_caps_entries() {
    let doc = Document {
        canvas_settings: CanvasSettings::default(),
        layers: vec![rect("a", 0.0, 0.0, 10.0, 10.0)],
    };
    let opts = ComposerOpts {
        history_limit: Some(3),
        ..ComposerOpts::default()
    };
    let mut c = Composer::with_document(doc, ComposerContext::headless(), opts).unwrap();
    c.execute_sync(Command::SelectAll);
    for _ in 0..5 {
        c.execute_sync(Command::Nudge { dx: 1.0, dy: 0.0 });
    }
    assert_eq!(c.history().len(), 3);
    c.execute_sync(Command::Undo);
    c.execute_sync(Command::Undo);
    c.execute_sync(Command::Undo);
    assert_eq!(c.layer(&id("a")).unwrap().x, 3.0);
}

#[test]
fn zoom_to_fit_centers_canvas() {
    let mut c = two_layers();
    c.execute_sync(Command::ZoomToFit);
    let center = c.viewport().scene_to_screen(Point::new(512.0, 512.0));
    assert!((center.x - 512.0).abs() < 1e-6);
    assert!((center.y - 384.0).abs() < 1e-6);
}
