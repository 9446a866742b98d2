use super::*;
use crate::foundation::core::BoundingBox;
use crate::scene::layer::LayerId;

fn layer(id: &str, x: f64) -> Layer {
    let mut l = Layer::new_image("x.png", BoundingBox::new(x, 0.0, 10.0, 10.0));
    l.id = LayerId::from(id);
    l
}

fn moved(layers: &[Layer], dx: f64) -> Vec<Layer> {
    layers
        .iter()
        .cloned()
        .map(|mut l| {
            l.x += dx;
            l
        })
        .collect()
}

#[test]
fn undo_restores_exact_prior_and_redo_reapplies() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    let before = h.current().to_vec();

    h.begin_interaction();
    let after = moved(h.current(), 5.0);
    assert!(h.commit(after.clone(), true));

    assert!(h.undo());
    assert_eq!(h.current(), before.as_slice());
    assert!(h.redo());
    assert_eq!(h.current(), after.as_slice());
}

#[test]
fn gesture_collapses_into_one_entry() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    h.begin_interaction();
    let start = h.current().to_vec();
    for i in 1..=30 {
        h.commit(moved(&start, f64::from(i)), false);
    }
    assert_eq!(h.len(), 1);
    assert!(h.commit(moved(&start, 30.0), true));
    assert_eq!(h.len(), 2);
    assert_eq!(h.current()[0].x, 30.0);
}

#[test]
fn unchanged_final_commit_is_dropped() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    h.begin_interaction();
    let start = h.current().to_vec();
    h.commit(moved(&start, 3.0), false);
    assert!(!h.commit(start, true));
    assert_eq!(h.len(), 1);
    assert!(!h.is_interacting());
}

#[test]
fn new_commit_truncates_redo_tail() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    h.commit(moved(h.current(), 1.0), true);
    h.commit(moved(h.current(), 1.0), true);
    assert_eq!(h.len(), 3);
    h.undo();
    h.undo();
    assert!(h.commit(moved(h.current(), 7.0), true));
    assert_eq!(h.len(), 2);
    assert!(!h.can_redo());
    assert_eq!(h.current()[0].x, 7.0);
}

#[test]
fn undo_redo_at_bounds_are_noops() {
    let mut h = History::new(vec![], None);
    for _ in 0..3 {
        assert!(!h.undo());
        assert!(!h.redo());
    }
    h.commit(vec![layer("a", 0.0)], true);
    assert!(h.undo());
    assert!(!h.undo());
    assert!(h.redo());
    assert!(!h.redo());
    assert_eq!(h.index(), 1);
}

#[test]
fn snapshots_are_independent_of_live_mutation() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    let mut live = h.current().to_vec();
    live[0].x = 99.0;
    h.commit(live.clone(), true);
    live[0].x = -1.0;
    h.undo();
    assert_eq!(h.current()[0].x, 0.0);
    h.redo();
    assert_eq!(h.current()[0].x, 99.0);
}

#[test]
fn rollback_discards_pending_preview() {
    let mut h = History::new(vec![layer("a", 0.0)], None);
    h.begin_interaction();
    h.commit(moved(h.current(), 50.0), false);
    h.rollback();
    assert_eq!(h.current()[0].x, 0.0);
    assert_eq!(h.len(), 1);
    assert!(!h.is_interacting());
}

#[test]
fn limit_drops_oldest_entries() {
    let mut h = History::new(vec![layer("a", 0.0)], Some(3));
    for _ in 0..5 {
        h.commit(moved(h.current(), 1.0), true);
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.index(), 2);
    assert!(h.undo());
    assert!(h.undo());
    assert!(!h.undo());
    assert_eq!(h.current()[0].x, 3.0);
}
