pub(crate) mod keys;
pub(crate) mod viewport;

pub use keys::{Key, KeyEvent, shortcut_for};
pub use viewport::{ToolMode, ToolState, Viewport};
