use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Route permission that grants every non-reserved route.
pub const WILDCARD_ROUTE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Nurse,
    Receptionist,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
        }
    }

    /// Routes granted when a profile does not list its own.
    pub fn default_routes(self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[WILDCARD_ROUTE],
            Role::Nurse => &["patients", "records", "medical-exams", "time-clock"],
            Role::Receptionist => &["patients", "staff", "time-clock", "dashboard"],
        }
    }
}

/// Row of the `user_profiles` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub permitted_routes: Vec<String>,
}

/// Authenticated identity and permission set for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_super_admin: bool,
    pub permitted_routes: BTreeSet<String>,
}

impl Session {
    pub fn from_profile(email: impl Into<String>, profile: UserProfile) -> Self {
        let permitted_routes = if profile.permitted_routes.is_empty() {
            profile
                .role
                .default_routes()
                .iter()
                .map(|r| r.to_string())
                .collect()
        } else {
            profile.permitted_routes.into_iter().collect()
        };

        Self {
            user_id: profile.user_id,
            email: email.into(),
            role: profile.role,
            is_super_admin: profile.is_super_admin,
            permitted_routes,
        }
    }

    pub fn has_wildcard(&self) -> bool {
        self.permitted_routes.contains(WILDCARD_ROUTE)
    }

    pub fn permits(&self, segment: &str) -> bool {
        self.permitted_routes.contains(segment)
    }
}
