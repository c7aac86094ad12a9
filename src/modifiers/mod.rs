//! Modifier pipeline and per-channel modifier slots

pub mod board;
pub mod pipeline;

pub use board::{ModifierBoard, ModifierFrame};
pub use pipeline::{apply, apply_bool_or, Modifier, ModifierValue, RawModifier, SourceTag};
