use async_trait::async_trait;
use axum::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use super::{Identity, IdentityError, IdentityVerifier, bearer_token};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (caller id)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// Verifies HS256 session tokens issued by the account service.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, IdentityError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| IdentityError::Rejected(e.to_string()))?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<Identity, IdentityError> {
        let token = bearer_token(headers)?;
        let claims = self.verify_token(token)?;
        if claims.sub.is_empty() {
            return Err(IdentityError::Rejected("empty subject".to_string()));
        }
        Ok(Identity::new(claims.sub))
    }
}
