//! Cutline Edit Engine
//!
//! Everything that mutates a project:
//! - **Geometry:** overlap-checked add/drag/resize/split/duplicate/delete
//! - **Snapping:** edge, playhead, and grid magnetism scaled by zoom
//! - **Gestures:** a modal `Idle -> Dragging | Resizing -> Idle` machine
//! - **History:** bounded undo/redo of whole-project snapshots
//! - **Session:** the single owner of a project, wiring the above together
//!
//! Every geometry operation either commits a state that satisfies the track
//! invariants or returns an [`EditError`] and leaves the project untouched.

pub mod error;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod session;
pub mod snap;

pub use error::*;
pub use geometry::*;
pub use gesture::*;
pub use history::*;
pub use session::*;
pub use snap::*;
