//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the doctor's identity in signed
//! claims. Verification is purely stateless: the identity presented to
//! handlers is reconstructed from the claims, never re-read from the
//! database, and expiry is the only termination mechanism — there is no
//! revocation list.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;

/// Verified caller identity, handed to every repository call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorIdentity {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — doctor id.
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token: {0}")]
    TokenInvalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issue a signed token asserting the given identity, valid for the
/// configured window (24 h by default).
pub fn issue_token(identity: &DoctorIdentity, config: &AppConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: identity.id.to_string(),
        email: identity.email.clone(),
        name: identity.display_name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.token_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verify signature and expiry, reconstructing the caller identity from
/// the signed claims. Zero leeway: a token is rejected the second it
/// expires.
pub fn verify_token(raw: &str, config: &AppConfig) -> Result<DoctorIdentity, AuthError> {
    let key = DecodingKey::from_secret(config.token_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "exp", "iat"]);

    let claims = jsonwebtoken::decode::<TokenClaims>(raw, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AuthError::TokenInvalid("non-numeric subject".into()))?;

    Ok(DoctorIdentity {
        id,
        email: claims.email,
        display_name: claims.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            token_secret: "test-secret".into(),
            token_ttl_hours: 24,
            bind_addr: "127.0.0.1:0".into(),
        }
    }

    fn identity() -> DoctorIdentity {
        DoctorIdentity {
            id: 7,
            email: "ana@clinica.test".into(),
            display_name: "Ana García".into(),
        }
    }

    /// Encode claims directly, bypassing `issue_token`, to control `exp`.
    fn encode_with_exp(exp: i64, config: &AppConfig) -> String {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: "7".into(),
            email: "ana@clinica.test".into(),
            name: "Ana García".into(),
            iat: now - 3600,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.token_secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn round_trip_reconstructs_identity() {
        let config = test_config();
        let token = issue_token(&identity(), &config).unwrap();
        let verified = verify_token(&token, &config).unwrap();
        assert_eq!(verified, identity());
    }

    #[test]
    fn expiry_honors_configured_ttl() {
        let config = test_config();
        let token = issue_token(&identity(), &config).unwrap();

        // Decode without validation to inspect raw claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.insecure_disable_signature_validation();
        let claims = jsonwebtoken::decode::<TokenClaims>(
            &token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn accepted_just_before_expiry() {
        let config = test_config();
        let token = encode_with_exp(Utc::now().timestamp() + 60, &config);
        assert!(verify_token(&token, &config).is_ok());
    }

    #[test]
    fn rejected_once_expired() {
        let config = test_config();
        let token = encode_with_exp(Utc::now().timestamp() - 2, &config);
        let err = verify_token(&token, &config).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn wrong_secret_rejected() {
        let config = test_config();
        let token = issue_token(&identity(), &config).unwrap();

        let other = AppConfig {
            token_secret: "different-secret".into(),
            ..test_config()
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn tampered_payload_rejected() {
        let config = test_config();
        let token = issue_token(&identity(), &config).unwrap();

        // Swap the payload segment for one claiming a different subject.
        let forged_payload = {
            use base64::Engine;
            let claims = TokenClaims {
                sub: "999".into(),
                email: "eva@clinica.test".into(),
                name: "Eva".into(),
                iat: Utc::now().timestamp(),
                exp: Utc::now().timestamp() + 3600,
                jti: Uuid::new_v4().to_string(),
            };
            base64::engine::general_purpose::URL_SAFE_NO_PAD
                .encode(serde_json::to_vec(&claims).unwrap())
        };
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(verify_token(&forged, &config).is_err());
    }

    #[test]
    fn garbage_rejected() {
        let config = test_config();
        assert!(verify_token("not-a-token", &config).is_err());
        assert!(verify_token("", &config).is_err());
    }

    #[test]
    fn tokens_carry_unique_ids() {
        let config = test_config();
        let t1 = issue_token(&identity(), &config).unwrap();
        let t2 = issue_token(&identity(), &config).unwrap();
        assert_ne!(t1, t2);
    }
}
