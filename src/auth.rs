//! Request-scoped actor identity resolved from bearer tokens.
//!
//! There is no implicit "current user": every operation receives the actor
//! that the token resolved to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AuthConfig;
use crate::error::FraudError;

/// What an actor is allowed to do. Viewers are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Analyst,
    Viewer,
}

/// Authenticated caller for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    /// Mutating operations require the analyst role.
    pub fn require_analyst(&self) -> Result<(), FraudError> {
        match self.role {
            Role::Analyst => Ok(()),
            Role::Viewer => Err(FraudError::Forbidden),
        }
    }
}

/// Maps bearer tokens onto actors.
pub struct TokenAuthenticator {
    tokens: HashMap<String, Actor>,
}

impl TokenAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|(token, actor)| {
                (
                    token.clone(),
                    Actor {
                        id: actor.id.clone(),
                        role: actor.role,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    /// Resolve an `Authorization` header value. Missing, malformed or
    /// unknown tokens all fail with `Unauthorized`.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Actor, FraudError> {
        let header = header.ok_or(FraudError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(FraudError::Unauthorized)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(FraudError::Unauthorized)
    }
}
