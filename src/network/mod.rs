//! The player's network: nodes, doctrine, upgrades and the tier ladder

pub mod doctrine;
pub mod nodes;
pub mod tiers;
pub mod upgrades;

pub use doctrine::Doctrine;
pub use nodes::{upgrade_cost, Node, NodeNetwork, MAX_NODE_LEVEL, MIN_NODE_LEVEL};
pub use tiers::{TierCatalog, TierDefinition};
pub use upgrades::UpgradeLevels;
