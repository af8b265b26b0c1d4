use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    name: String,
    iat: u64,
    exp: u64,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_expiry_secs: config.token_expiry.as_secs(),
        }
    }

    pub fn generate(&self, user_id: i32, email: &str, name: &str) -> Result<String, AppError> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + self.token_expiry_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(format!("Invalid or expired token: {}", e)))?;

        let claims = token_data.claims;
        let id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::Auth("Malformed subject claim".to_string()))?;

        Ok(AuthenticatedUser {
            id,
            email: claims.email,
            name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service(expiry: Duration) -> TokenService {
        TokenService::new(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry: expiry,
        })
    }

    #[test]
    fn test_generate_and_verify_round_trip() {
        let tokens = service(Duration::from_secs(3600));

        let token = tokens.generate(7, "owner@example.com", "Owner Seven").unwrap();
        let user = tokens.verify(&token).unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.email, "owner@example.com");
        assert_eq!(user.name, "Owner Seven");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = service(Duration::from_secs(3600));
        let verifier = TokenService::new(AuthConfig {
            jwt_secret: "other-secret".to_string(),
            token_expiry: Duration::from_secs(3600),
        });

        let token = issuer.generate(7, "owner@example.com", "Owner").unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = service(Duration::from_secs(3600));
        assert!(tokens.verify("not-a-jwt").is_err());
    }
}
