use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

/// An account of the external authentication system. Only its id is known here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct User;

impl HasId for User {
    type IdType = String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Coordinator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver => f.write_str("driver"),
            Self::Coordinator => f.write_str("coordinator"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver" => Ok(Self::Driver),
            "coordinator" => Ok(Self::Coordinator),
            other => Err(format!("unknown role `{}`", other)),
        }
    }
}

/// The authenticated actor behind a request. Passed explicitly to every
/// operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Id<User>,
    pub role: Role,
}

impl Session {
    pub fn new<S: Into<String>>(user: S, role: Role) -> Self {
        Self {
            user: Id::new(user.into()),
            role,
        }
    }

    pub fn driver<S: Into<String>>(user: S) -> Self {
        Self::new(user, Role::Driver)
    }

    pub fn coordinator<S: Into<String>>(user: S) -> Self {
        Self::new(user, Role::Coordinator)
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}
