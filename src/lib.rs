//! Undernet - tick-driven simulation core for an incremental network game

pub mod analysis;
pub mod constraints;
pub mod core;
pub mod modifiers;
pub mod network;
pub mod resources;
pub mod simulation;
