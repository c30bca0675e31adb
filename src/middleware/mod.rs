use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by a validated service-to-service credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub subject: String,
    pub audience: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Seam to the auth-service SDK. Token validation itself lives behind this
/// trait; the middleware only handles the credential envelope.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Cross-cutting inter-service auth component held by the dependency container.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn verify_bearer(&self, header: &str) -> Result<TokenClaims, AuthError>;
}

/// Default middleware: strips the `Bearer ` scheme, delegates to the
/// validator, rejects expired claims.
pub struct ServiceAuthMiddleware {
    validator: Arc<dyn TokenValidator>,
}

impl ServiceAuthMiddleware {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Middleware for ServiceAuthMiddleware {
    async fn verify_bearer(&self, header: &str) -> Result<TokenClaims, AuthError> {
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AuthError::Unauthorized("authorization header is not a bearer credential".to_string())
        })?;
        let claims = self.validator.validate(token).await?;
        if claims.expires_at <= Utc::now() {
            return Err(AuthError::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }
}
