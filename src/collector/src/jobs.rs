//! CI job tree.
//!
//! The CI server groups jobs into folders (organisations, multi-branch
//! projects). A pipeline is identified by the `/`-joined path of its job,
//! e.g. `org/repo/master`.

use serde::{Deserialize, Serialize};

/// A job, or a folder of jobs when `jobs` is non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<JobNode>,
}

impl JobNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: Vec::new(),
        }
    }

    pub fn folder(name: impl Into<String>, jobs: Vec<JobNode>) -> Self {
        Self {
            name: name.into(),
            jobs,
        }
    }

    pub fn is_folder(&self) -> bool {
        !self.jobs.is_empty()
    }
}

/// Full names of every leaf job, depth first.
///
/// Folders themselves do not run pipelines and are not listed.
pub fn flatten_job_names(roots: &[JobNode]) -> Vec<String> {
    let mut names = Vec::new();
    for root in roots {
        collect_job_names(root, &root.name, &mut names);
    }
    names
}

fn collect_job_names(node: &JobNode, full_name: &str, names: &mut Vec<String>) {
    if !node.is_folder() {
        names.push(full_name.to_string());
        return;
    }

    for child in &node.jobs {
        collect_job_names(child, &format!("{full_name}/{}", child.name), names);
    }
}
