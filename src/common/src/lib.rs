pub mod cli;
pub mod config;
pub mod model;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::Configuration;
pub use model::{ActivityRecord, RefSet, RefSetError};
