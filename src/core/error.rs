use thiserror::Error;

#[derive(Error, Debug)]
pub enum UndernetError {
    #[error("Unknown {kind}: {name}")]
    UnknownIdentifier { kind: &'static str, name: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Save data could not be recovered: {0}")]
    CorruptSave(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl UndernetError {
    pub fn unknown(kind: &'static str, name: &str) -> Self {
        Self::UnknownIdentifier {
            kind,
            name: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UndernetError>;

/// Why a mutation request was refused. A refused request changes nothing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("Insufficient influence: need {needed:.1}, have {available:.1}")]
    InsufficientInfluence { needed: f64, available: f64 },

    #[error("Node capacity reached ({capacity})")]
    CapacityReached { capacity: usize },

    #[error("No node at index {0}")]
    NodeNotFound(usize),

    #[error("Node {index} already at max level {level}")]
    MaxLevel { index: usize, level: u8 },

    #[error("Node {0} is not degraded")]
    NotDegraded(usize),

    #[error("Doctrine already active")]
    AlreadyActive,

    #[error("Upgrade already at max level")]
    UpgradeMaxed,

    #[error("Constraint is not registered")]
    ConstraintNotRegistered,

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),
}
