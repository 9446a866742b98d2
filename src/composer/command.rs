use crate::edit::ops::{Alignment, Axis};
use crate::view::viewport::ToolMode;

/// Every user action the composer understands, whatever input produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Undo,
    Redo,
    DeleteSelection,
    DuplicateSelection,
    RaiseSelection,
    LowerSelection,
    BringToFront,
    SendToBack,
    SelectAll,
    DeselectAll,
    ExportSelection,
    SetTool(ToolMode),
    Nudge { dx: f64, dy: f64 },
    Align(Alignment),
    Distribute(Axis),
    DistributeAndScale(Axis),
    MergeSelection,
    BakeSelection,
    ZoomToFit,
}
