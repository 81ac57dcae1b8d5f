use std::collections::HashMap;

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;

/// Verifies opaque bearer credentials against the configured token table.
pub struct TokenVerifier {
    tokens: HashMap<String, String>, // token -> principal name
}

impl TokenVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let tokens = config
            .api_tokens
            .into_iter()
            .map(|(name, token)| (token, name))
            .collect();
        Self { tokens }
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        self.tokens
            .get(token)
            .map(|name| AuthenticatedUser {
                subject: name.clone(),
            })
            .ok_or_else(|| AppError::Unauthorized("Invalid authentication credentials".to_string()))
    }
}
