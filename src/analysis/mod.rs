//! Long-run analysis over the tick stream: stability and adaptive difficulty

pub mod adaptive;
pub mod equilibrium;

pub use adaptive::{AdaptationReport, AdaptiveLoop, AdaptiveSample, TuningScalars};
pub use equilibrium::{
    classify, EquilibriumClassifier, EquilibriumState, EquilibriumTransition, StabilityState,
};
