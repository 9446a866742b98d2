use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn screen_scene_round_trip() {
    let mut v = Viewport::new(800.0, 600.0);
    v.pan = Vec2::new(100.0, 50.0);
    v.scale = 2.0;
    let scene = v.screen_to_scene(Point::new(300.0, 250.0));
    assert_eq!(scene, Point::new(100.0, 100.0));
    assert_eq!(v.scene_to_screen(scene), Point::new(300.0, 250.0));
    assert_eq!(v.screen_delta_to_scene(Vec2::new(10.0, 4.0)), Vec2::new(5.0, 2.0));
}

#[test]
fn zoom_keeps_anchor_fixed() {
    let mut v = Viewport::new(800.0, 600.0);
    let anchor = Point::new(200.0, 150.0);
    let before = v.screen_to_scene(anchor);
    v.zoom_at(anchor, 2.5);
    let after = v.screen_to_scene(anchor);
    assert!(close(before.x, after.x) && close(before.y, after.y));
    assert!(close(v.scale, 2.5));
}

#[test]
fn zoom_is_clamped() {
    let mut v = Viewport::new(100.0, 100.0).with_scale_limits(0.5, 4.0);
    v.zoom_at(Point::ZERO, 100.0);
    assert_eq!(v.scale, 4.0);
    v.zoom_at(Point::ZERO, 0.0001);
    assert_eq!(v.scale, 0.5);
    v.zoom_at(Point::ZERO, f64::NAN);
    assert_eq!(v.scale, 0.5);
}

#[test]
fn zoom_to_fit_centers_bounds() {
    let mut v = Viewport::new(1000.0, 500.0);
    v.zoom_to_fit(BoundingBox::new(0.0, 0.0, 200.0, 200.0), 50.0);
    assert!(close(v.scale, 2.0));
    let c = v.scene_to_screen(Point::new(100.0, 100.0));
    assert!(close(c.x, 500.0) && close(c.y, 250.0));
}

#[test]
fn space_forces_hand_tool() {
    let mut t = ToolState::default();
    assert_eq!(t.effective(), ToolMode::Select);
    t.space_held = true;
    assert_eq!(t.effective(), ToolMode::Hand);
    t.space_held = false;
    t.mode = ToolMode::Hand;
    assert_eq!(t.effective(), ToolMode::Hand);
}
