/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard roles recognised by the gateway
///
/// `Admin` is the only super-role; every other role is confined to the
/// namespaces registered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Admin,
    Instructor,
    Counselor,
    Hr,
    ContentWriter,
    Student,
    Agent,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Instructor,
        Role::Counselor,
        Role::Hr,
        Role::ContentWriter,
        Role::Student,
        Role::Agent,
    ];

    /// Canonical uppercase name, as carried in identity headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Instructor => "INSTRUCTOR",
            Role::Counselor => "COUNSELOR",
            Role::Hr => "HR",
            Role::ContentWriter => "CONTENT_WRITER",
            Role::Student => "STUDENT",
            Role::Agent => "AGENT",
        }
    }

    /// Path segment the built-in registry table assigns to this role
    pub fn default_segment(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Counselor => "counselor",
            Role::Hr => "hr",
            Role::ContentWriter => "content-writer",
            Role::Student => "student",
            Role::Agent => "agent",
        }
    }

    /// Access rule: the holder of `self` may enter a namespace owned by `required`.
    pub fn can_access(self, required: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::Instructor
            | Role::Counselor
            | Role::Hr
            | Role::ContentWriter
            | Role::Student
            | Role::Agent => self == required,
        }
    }

    /// Uppercase a role string the way upstream identity sources are normalized
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; upstream sources hand out mixed-case role names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = Role::normalize(s);
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or(UnknownRole(normalized))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
