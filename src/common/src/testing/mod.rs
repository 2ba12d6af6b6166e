//! Test utilities for activity-gc.
//!
//! This module provides reusable helpers for building test configurations
//! and activity fixtures.
//!
//! # Feature Flag
//!
//! This module is only available when the `testing` feature is enabled or during tests:
//!
//! ```toml
//! [dev-dependencies]
//! common = { path = "src/common", features = ["testing"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use common::testing::TestConfigBuilder;
//!
//! let config = TestConfigBuilder::new()
//!     .with_data_dir("/tmp/gc")
//!     .dry_run()
//!     .build();
//! ```

mod config_builder;
mod fixtures;

pub use config_builder::TestConfigBuilder;
pub use fixtures::{completed_activity, running_activity};
