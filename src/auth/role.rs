//! Roles and their ordering

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access role. Higher roles pass every lower gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Anonymous,
    Author,
    Editor,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Author => "author",
            Role::Editor => "editor",
            Role::Administrator => "administrator",
        }
    }

    /// Parse a role name. Unknown names resolve to `Anonymous`.
    pub fn parse(name: &str) -> Self {
        match name {
            "author" => Role::Author,
            "editor" => Role::Editor,
            "administrator" => Role::Administrator,
            _ => Role::Anonymous,
        }
    }

    /// Returns whether this role passes a gate requiring `required`
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Editors and administrators may mutate documents they do not own
    pub fn bypasses_ownership(&self) -> bool {
        self.at_least(Role::Editor)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::parse(&name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
