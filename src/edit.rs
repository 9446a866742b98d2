pub(crate) mod history;
pub(crate) mod interaction;
pub(crate) mod ops;

pub use history::History;
pub use interaction::{
    Handle, HitTarget, Interaction, InteractionKind, Modifiers, ROTATION_SNAP_DEG, hit_test,
    layers_in_rect, selection_handles,
};
pub use ops::{
    Alignment, Axis, align, bring_to_front, delete, distribute, distribute_and_scale, duplicate,
    lower, nudge, raise, send_to_back,
};
