//! Ref-set decoding.
//!
//! A ref-set names the base commit a CI run was built against plus the
//! pending change commits merged on top of it:
//!
//! ```text
//! master:ef08a6cd,2739:5b351f4e,2822:bac2a1f3
//! ```
//!
//! Pairs are separated by `,`. Each pair is split on its first `:`. The
//! first pair is `<base branch>:<base sha>`, every following pair is
//! `<change id>:<sha>`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable the event-driven front end exports the ref-set in.
pub const PULL_REFS_ENV: &str = "PULL_REFS";

const PAIR_SEPARATOR: char = ',';
const KEY_VALUE_SEPARATOR: char = ':';

/// Decoded form of a ref-set string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSet {
    pub base_branch: String,
    pub base_sha: String,
    /// Change identifier (usually a pull request number) to commit sha.
    pub to_merge: BTreeMap<String, String>,
}

impl RefSet {
    /// Read and decode the ref-set from [`PULL_REFS_ENV`].
    pub fn from_env() -> Result<Self, RefSetError> {
        let value = std::env::var(PULL_REFS_ENV).map_err(|_| RefSetError::NotSet {
            variable: PULL_REFS_ENV,
        })?;
        parse_ref_set(&value)
    }

    /// More than one pending change is merged into this run.
    pub fn is_batch(&self) -> bool {
        self.to_merge.len() > 1
    }
}

impl FromStr for RefSet {
    type Err = RefSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ref_set(s)
    }
}

/// Canonical encoding: base pair first, merge pairs ordered by change id.
impl fmt::Display for RefSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.base_branch, self.base_sha)?;
        for (change, sha) in &self.to_merge {
            write!(f, ",{change}:{sha}")?;
        }
        Ok(())
    }
}

/// Decode a ref-set string.
///
/// A change identifier listed twice keeps the sha of its last pair.
///
/// # Errors
///
/// Fails if the input is empty, if any pair lacks a `:`, or if a key or
/// value is empty.
pub fn parse_ref_set(input: &str) -> Result<RefSet, RefSetError> {
    if input.is_empty() {
        return Err(RefSetError::Empty);
    }

    let mut pairs = input.split(PAIR_SEPARATOR).map(split_pair);

    let (base_branch, base_sha) = pairs.next().ok_or(RefSetError::Empty)??;

    let mut to_merge = BTreeMap::new();
    for pair in pairs {
        let (change, sha) = pair?;
        // A repeated change id keeps its last sha
        to_merge.insert(change.to_string(), sha.to_string());
    }

    Ok(RefSet {
        base_branch: base_branch.to_string(),
        base_sha: base_sha.to_string(),
        to_merge,
    })
}

fn split_pair(pair: &str) -> Result<(&str, &str), RefSetError> {
    let (key, value) =
        pair.split_once(KEY_VALUE_SEPARATOR)
            .ok_or_else(|| RefSetError::MissingDelimiter {
                pair: pair.to_string(),
            })?;

    if key.is_empty() || value.is_empty() {
        return Err(RefSetError::EmptyField {
            pair: pair.to_string(),
        });
    }

    Ok((key, value))
}

/// Errors produced while decoding a ref-set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefSetError {
    #[error("ref-set is empty")]
    Empty,

    #[error("ref-set pair '{pair}' is missing the ':' delimiter")]
    MissingDelimiter { pair: String },

    #[error("ref-set pair '{pair}' has an empty key or value")]
    EmptyField { pair: String },

    #[error("environment variable {variable} is not set")]
    NotSet { variable: &'static str },
}
