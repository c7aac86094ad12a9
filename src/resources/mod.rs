//! Resource registry and the per-tick formulas that drive it

pub mod engine;
pub mod momentum;
pub mod registry;
pub mod safety;

pub use engine::{base_risk_gain, global_efficiency_curve, EngineContext, EngineReport, ResourceEngine};
pub use momentum::RiskMomentum;
pub use registry::{Resource, ResourceRegistry};
