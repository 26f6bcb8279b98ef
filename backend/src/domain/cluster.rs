//! Clusters: named groups of students such as a course roster.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{ClassSessionId, ClusterId, UserId};

/// Maximum allowed length for a cluster name.
pub const CLUSTER_NAME_MAX: usize = 64;

/// Validation errors returned by [`ClusterName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterValidationError {
    #[error("cluster name must not be empty")]
    EmptyName,
    #[error("cluster name must be at most {max} characters")]
    NameTooLong { max: usize },
}

/// Unique, human-readable cluster name (for example `IELTS-A`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClusterName(String);

impl ClusterName {
    /// Validate and construct a [`ClusterName`]; surrounding whitespace is
    /// dropped.
    pub fn new(raw: impl Into<String>) -> Result<Self, ClusterValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClusterValidationError::EmptyName);
        }
        if trimmed.chars().count() > CLUSTER_NAME_MAX {
            return Err(ClusterValidationError::NameTooLong {
                max: CLUSTER_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ClusterName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ClusterName> for String {
    fn from(value: ClusterName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ClusterName {
    type Error = ClusterValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Cluster document.
///
/// ## Invariants
/// - `students` equals the set of users whose `in_cluster` contains `id`.
/// - `in_class` equals the set of sessions whose `classcodes` contain `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: ClusterId,
    pub name: ClusterName,
    pub students: BTreeSet<UserId>,
    pub in_class: BTreeSet<ClassSessionId>,
}

impl Cluster {
    /// Build a cluster with the given students and no sessions.
    #[must_use]
    pub fn new(id: ClusterId, name: ClusterName, students: BTreeSet<UserId>) -> Self {
        Self {
            id,
            name,
            students,
            in_class: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("IELTS-A", Ok("IELTS-A"))]
    #[case("  Grade 7 Maths ", Ok("Grade 7 Maths"))]
    #[case("   ", Err(ClusterValidationError::EmptyName))]
    fn name_validation(#[case] raw: &str, #[case] expected: Result<&str, ClusterValidationError>) {
        let result = ClusterName::new(raw);
        match expected {
            Ok(value) => assert_eq!(result.expect("valid name").as_ref(), value),
            Err(err) => assert_eq!(result.expect_err("invalid name"), err),
        }
    }

    #[rstest]
    fn overly_long_names_are_rejected() {
        let raw = "x".repeat(CLUSTER_NAME_MAX + 1);
        assert_eq!(
            ClusterName::new(raw),
            Err(ClusterValidationError::NameTooLong {
                max: CLUSTER_NAME_MAX
            })
        );
    }
}
