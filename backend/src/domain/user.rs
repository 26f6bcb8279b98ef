//! User accounts, roles, and role capabilities.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::{ClassSessionId, ClusterId, UserId};

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 32;

/// Validation errors returned by [`Username::new`] and [`UserRole::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("username may only contain letters, numbers, '.', '-' or '_'")]
    UsernameInvalidCharacters,
    #[error("role must be one of admin, teacher, or student")]
    UnknownRole,
}

/// Unique login name of a user.
///
/// ## Invariants
/// - Trimmed of surrounding whitespace.
/// - Between [`USERNAME_MIN`] and [`USERNAME_MAX`] characters.
/// - Only ASCII letters, digits, `.`, `-`, and `_`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    ///
    /// # Examples
    /// ```
    /// use roster::domain::Username;
    ///
    /// assert!(Username::new("ada_l").is_ok());
    /// assert!(Username::new("a").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = trimmed.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
        if !trimmed.chars().all(allowed) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Role of a user within the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

/// Actions gated by role.
///
/// Role checks belong to the calling adapter; the reconciliation engine never
/// branches on role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create and remove user accounts.
    ManageUsers,
    /// Create, edit, and delete clusters and their memberships.
    ManageClusters,
    /// Create, edit, and delete class sessions.
    ScheduleSessions,
    /// Read roster projections.
    ViewRoster,
}

impl UserRole {
    /// Stable lowercase name used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Whether this role grants `capability`.
    ///
    /// # Examples
    /// ```
    /// use roster::domain::{Capability, UserRole};
    ///
    /// assert!(UserRole::Teacher.permits(Capability::ScheduleSessions));
    /// assert!(!UserRole::Teacher.permits(Capability::ManageClusters));
    /// ```
    #[must_use]
    pub const fn permits(self, capability: Capability) -> bool {
        match (self, capability) {
            (Self::Admin, _) | (_, Capability::ViewRoster) => true,
            (Self::Teacher, Capability::ScheduleSessions) => true,
            (Self::Teacher | Self::Student, _) => false,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// User document.
///
/// `in_cluster` and `in_class` are back-references. They are written only by
/// the membership reconciler and the cascade deleter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub role: UserRole,
    pub in_cluster: BTreeSet<ClusterId>,
    pub in_class: BTreeSet<ClassSessionId>,
}

impl User {
    /// Build a user with no memberships.
    #[must_use]
    pub fn new(id: UserId, username: Username, role: UserRole) -> Self {
        Self {
            id,
            username,
            role,
            in_cluster: BTreeSet::new(),
            in_class: BTreeSet::new(),
        }
    }
}
