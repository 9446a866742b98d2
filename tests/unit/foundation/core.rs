use super::*;

#[test]
fn from_points_normalizes_corners() {
    let b = BoundingBox::from_points(Point::new(10.0, 40.0), Point::new(-5.0, 20.0));
    assert_eq!(b, BoundingBox::new(-5.0, 20.0, 15.0, 20.0));
}

#[test]
fn intersects_touching_edges() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 5.0, 5.0);
    let c = BoundingBox::new(10.5, 0.0, 5.0, 5.0);
    assert!(a.intersects(b));
    assert!(!a.intersects(c));
}

#[test]
fn union_covers_both() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(20.0, -5.0, 5.0, 5.0);
    assert_eq!(a.union(b), BoundingBox::new(0.0, -5.0, 25.0, 15.0));
}

#[test]
fn premul_array_scales_channels() {
    assert_eq!(Rgba8::new(255, 128, 0, 128).to_premul_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8::transparent().to_premul_array(), [0, 0, 0, 0]);
}
