pub mod activity;
pub mod refset;

pub use activity::{ActivityRecord, activity_name};
pub use refset::{PULL_REFS_ENV, RefSet, RefSetError, parse_ref_set};
