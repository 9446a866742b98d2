pub(crate) mod actions;
pub(crate) mod command;
pub(crate) mod context;
pub(crate) mod state;

pub use actions::{DropOutcome, PendingGeneration};
pub use command::Command;
pub use context::{ComposerContext, ComposerOpts};
pub use state::Composer;
