//! Priority-ordered constraints and the collapse transition they drive

pub mod collapse;
pub mod constraint;
pub mod dispatcher;

pub use collapse::{CollapseDefinition, CollapseMachine, CollapsePhase, CollapseReport, CollapseTarget};
pub use constraint::{Constraint, ConstraintSet};
pub use dispatcher::{dispatch_constraints, force_collapse};
