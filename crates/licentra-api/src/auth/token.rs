//! Signed-token issuance and verification.
//!
//! Tokens carry `{sub: email, role, iat, exp}` and are signed with the
//! server-held secret using the configured HS-family algorithm. Every
//! verification failure collapses to one uniform Unauthorized error so
//! callers never learn which check failed.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use licentra_core::models::UserRole;
use licentra_core::{AppError, AuthConfig};
use serde::{Deserialize, Serialize};

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal email
    pub sub: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl_minutes: i64,
}

impl TokenSigner {
    pub fn from_config(config: &AuthConfig) -> Result<Self, anyhow::Error> {
        let algorithm = match config.jwt_algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(anyhow::anyhow!("Unsupported signing algorithm: {}", other)),
        };

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm,
            ttl_minutes: config.token_ttl_minutes,
        })
    }

    /// Issue a token for the given principal.
    pub fn issue(&self, email: &str, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.ttl_minutes)).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate signature and expiry. Bad signature, malformed token, and
    /// expired token are indistinguishable to the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })
    }

    /// Token lifetime in seconds, as reported in login responses.
    pub fn expires_in_secs(&self) -> i64 {
        self.ttl_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use licentra_core::ErrorMetadata;

    fn signer(ttl_minutes: i64) -> TokenSigner {
        TokenSigner::from_config(&AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_minutes: ttl_minutes,
            api_key_prefix: "sk-sdk-".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let signer = signer(60);
        let token = signer.issue("user@example.com", UserRole::Customer).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user@example.com");
        assert_eq!(claims.role, UserRole::Customer);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer(-5);
        let token = signer.issue("user@example.com", UserRole::Admin).unwrap();
        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer(60).issue("user@example.com", UserRole::Admin).unwrap();

        let other = TokenSigner::from_config(&AuthConfig {
            jwt_secret: "ffffffffffffffffffffffffffffffff".to_string(),
            jwt_algorithm: "HS256".to_string(),
            token_ttl_minutes: 60,
            api_key_prefix: "sk-sdk-".to_string(),
        })
        .unwrap();

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_failures_are_uniform_unauthorized() {
        let signer = signer(60);
        let garbage = signer.verify("not-a-token").unwrap_err();
        let expired = {
            let short = self::signer(-5);
            let token = short.issue("a@b.c", UserRole::Admin).unwrap();
            short.verify(&token).unwrap_err()
        };

        for err in [garbage, expired] {
            assert_eq!(err.http_status_code(), 401);
            assert_eq!(err.client_message(), INVALID_CREDENTIALS);
        }
    }

    #[test]
    fn test_unsupported_algorithm_refused() {
        let result = TokenSigner::from_config(&AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_algorithm: "RS256".to_string(),
            token_ttl_minutes: 60,
            api_key_prefix: "sk-sdk-".to_string(),
        });
        assert!(result.is_err());
    }
}
