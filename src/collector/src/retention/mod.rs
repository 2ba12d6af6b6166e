//! Retention policy for pipeline activities.
//!
//! ## Architecture
//!
//! - `config`: Thresholds, derived from the `[gc]` configuration section
//! - `policy`: The three deletion passes and the resulting [`DeletionPlan`]
//!
//! ## Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use collector::retention::{RetentionConfig, RetentionPolicy};
//!
//! let policy = RetentionPolicy::new(RetentionConfig::default())?;
//! let plan = policy.compute_deletions(&[], None, Utc::now())?;
//!
//! for deletion in &plan {
//!     println!("{} ({})", deletion.name, deletion.reason);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod policy;

// Re-export commonly used types
pub use config::{RetentionConfig, RetentionConfigError};
pub use policy::{DeletionPlan, DeletionReason, PlannedDeletion, RetentionError, RetentionPolicy};
