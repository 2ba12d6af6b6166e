use thiserror::Error;

use crate::retention::{RetentionConfigError, RetentionError};
use crate::store::StoreError;

/// Errors that abort a garbage collection run.
#[derive(Error, Debug)]
pub enum GcError {
    #[error("invalid retention configuration: {0}")]
    Config(#[from] RetentionConfigError),

    #[error(transparent)]
    Retention(#[from] RetentionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GcError {
    /// The run failed because an activity was already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GcError::Store(e) if e.is_not_found())
    }
}

pub type GcResult<T> = Result<T, GcError>;
