use thiserror::Error;

use crate::roles::{Role, RoleNotFoundError};

/// The generator order could not be derived from role declarations.
#[derive(Debug, Clone, Error)]
pub enum ScheduleError {
    #[error("generators {} depend on each other", .generators.join(", "))]
    Cycle { generators: Vec<String> },

    #[error("generator '{generator}' requires role '{role}' but no earlier generator provides it")]
    Unprovided { generator: String, role: Role },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    RoleNotFound(#[from] RoleNotFoundError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("module '{module}': {message}")]
    Descriptor { module: String, message: String },

    #[error("module '{module}' has {count} lint error(s)")]
    Lint { module: String, count: usize },
}

impl GenerationError {
    pub fn descriptor(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            module: module.into(),
            message: message.into(),
        }
    }
}
