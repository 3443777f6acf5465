//! Cutline Project Model
//!
//! Defines the core data contracts for Cutline projects:
//! - **Tracks:** ordered, type-homogeneous lanes; array order is z-order
//! - **Clips:** time-bounded references to media or text placed on a track
//! - **Effects:** ordered per-pixel adjustments and boundary transitions
//! - **Assets:** in-memory registry of imported media, re-linked by id
//! - **Project:** the persisted JSON document tying it together
//!
//! All times are in seconds on the timeline unless stated otherwise.

pub mod asset;
pub mod clip;
pub mod effect;
pub mod project;
pub mod text;
pub mod track;

pub use asset::*;
pub use clip::*;
pub use effect::*;
pub use project::*;
pub use text::*;
pub use track::*;
