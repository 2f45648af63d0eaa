//! Test accounts for the three application roles

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

const SEED_PASSWORD: &str = "12345678Za!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Guide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUser {
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Accounts used by the suite, one per role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixtures {
    pub user: TestUser,
    pub guide: TestUser,
    pub admin: TestUser,
}

impl Default for Fixtures {
    /// Accounts created by the backend's seed migrations
    fn default() -> Self {
        Self {
            user: TestUser::new("user1@gmail.com", SEED_PASSWORD),
            guide: TestUser::new("guide1@gmail.com", SEED_PASSWORD),
            admin: TestUser::new("admin@gmail.com", SEED_PASSWORD),
        }
    }
}

impl Fixtures {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let fixtures: Self = serde_yaml::from_str(yaml)?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            E2eError::Fixture(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given, otherwise use the seeded accounts
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, role: Role) -> &TestUser {
        match role {
            Role::User => &self.user,
            Role::Guide => &self.guide,
            Role::Admin => &self.admin,
        }
    }

    fn validate(&self) -> E2eResult<()> {
        for role in [Role::User, Role::Guide, Role::Admin] {
            let account = self.get(role);
            if account.email.trim().is_empty() || account.password.is_empty() {
                return Err(E2eError::Fixture(format!(
                    "{} account needs both email and password",
                    role.as_str()
                )));
            }
        }
        Ok(())
    }
}
