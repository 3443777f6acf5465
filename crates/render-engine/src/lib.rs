//! Cutline Render Engine
//!
//! Turns a [`Project`](cutline_project_model::Project) into pictures and
//! keeps clip audio in step with them.
//!
//! # Pipeline Architecture
//!
//! ```text
//! AssetSource ──┐
//!               ├── Compositor (tracks back to front)
//! Project ──────┘        │  effects → opacity → transition → alpha-over
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//!  PreviewPlayer                   ExportPipeline
//!  (PlaybackClock)                 (VirtualClock, FramePacer)
//!        │                               │
//!        └──── AudioSyncController ──────┤
//!              (MediaTransport)          ▼
//!                                   EncoderSink
//! ```

pub mod audio_sync;
pub mod compositor;
pub mod effects;
pub mod error;
pub mod export;
pub mod frame;
pub mod preview;
pub mod sink;
pub mod text;
pub mod transition;

pub use audio_sync::*;
pub use compositor::*;
pub use effects::*;
pub use error::*;
pub use export::*;
pub use frame::*;
pub use preview::*;
pub use sink::*;
pub use text::*;
pub use transition::*;
