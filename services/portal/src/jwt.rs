//! JWT service for token generation and validation
//!
//! Access tokens are signed with HS256 using a shared secret and carry the
//! authenticated identity (id, email, role) that the authorization gate
//! keys off. Tokens are stateless; expiry is the only revocation.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::{Role, User};

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 1 hour)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared signing secret
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 3600)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.config.access_token_expiry,
            token_type: TokenType::Access,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use chrono::Utc;

    fn test_service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            access_token_expiry: 3600,
        })
        .unwrap()
    }

    fn test_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = test_service("test-secret");
        let user = test_user(Role::Mentor);

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Mentor);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_token_type_serializes_lowercase() {
        let json = serde_json::to_value(TokenType::Access).unwrap();
        assert_eq!(json, serde_json::json!("access"));
        let json = serde_json::to_value(TokenType::Refresh).unwrap();
        assert_eq!(json, serde_json::json!("refresh"));
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let signer = test_service("secret-a");
        let verifier = test_service("secret-b");
        let user = test_user(Role::Student);

        let token = signer.generate_access_token(&user).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service("test-secret");
        assert!(service.validate_token("not-a-jwt").is_err());
    }
}
