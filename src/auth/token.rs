// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access and refresh token issuance.
//!
//! Access tokens are HS256 JWTs whose subject is the user id. Validation is
//! stateless: signature, algorithm, and expiry are checked, nothing is looked
//! up. Refresh tokens are opaque random strings whose validity lives in the
//! session store.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};

use super::claims::AccessClaims;
use crate::models::UserId;

/// Number of random bytes in a refresh token (hex-encoded to twice as many chars).
pub const REFRESH_TOKEN_BYTES: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, unexpected algorithm, malformed, or expired.
    #[error("invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token subject")]
    InvalidSubject,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("secure random source unavailable")]
    Random,
}

impl TokenError {
    /// True when the error is attributable to the presented token.
    pub fn is_rejection(&self) -> bool {
        matches!(self, TokenError::InvalidToken(_) | TokenError::InvalidSubject)
    }
}

/// Stateless token manager; holds only the signing secret.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    rng: SystemRandom,
}

impl TokenManager {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a signed access token for `user_id` expiring `ttl` from now.
    pub fn new_access_token(&self, user_id: UserId, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    /// Verify an access token and return the user id in its subject.
    pub fn parse_access_token(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::InvalidToken)?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::InvalidSubject)
    }

    /// Generate an opaque refresh token from the OS CSPRNG.
    pub fn new_refresh_token(&self) -> Result<String, TokenError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| TokenError::Random)?;
        Ok(hex::encode(bytes))
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn manager() -> TokenManager {
        TokenManager::new("test-secret")
    }

    #[test]
    fn access_token_round_trips_user_id() {
        let tokens = manager();
        let token = tokens.new_access_token(42, Duration::minutes(15)).unwrap();
        assert_eq!(tokens.parse_access_token(&token).unwrap(), 42);
    }

    #[test]
    fn access_token_expiry_is_ttl_from_issuance() {
        let tokens = manager();
        let before = Utc::now().timestamp();
        let token = tokens.new_access_token(1, Duration::seconds(900)).unwrap();

        let claims = jsonwebtoken::dangerous::insecure_decode::<AccessClaims>(&token)
            .unwrap()
            .claims;
        assert_eq!(claims.sub, "1");
        assert!(claims.exp - claims.iat == 900);
        assert!(claims.iat >= before);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = TokenManager::new("other-secret")
            .new_access_token(1, Duration::minutes(5))
            .unwrap();

        match manager().parse_access_token(&token) {
            Err(TokenError::InvalidToken(e)) => {
                assert!(matches!(e.kind(), ErrorKind::InvalidSignature))
            }
            other => panic!("expected invalid signature, got {other:?}"),
        }
    }

    #[test]
    fn malformed_token_is_rejected() {
        let result = manager().parse_access_token("not-a-jwt");
        assert!(matches!(result, Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn unexpected_algorithm_is_rejected() {
        let claims = AccessClaims {
            sub: "1".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let result = manager().parse_access_token(&token);
        assert!(matches!(result, Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn non_numeric_subject_is_invalid_subject() {
        let claims = AccessClaims {
            sub: "user_123".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let result = manager().parse_access_token(&token);
        assert!(matches!(result, Err(TokenError::InvalidSubject)));
    }

    #[test]
    fn already_expired_token_is_rejected() {
        let tokens = manager();
        let token = tokens.new_access_token(1, Duration::seconds(-10)).unwrap();

        match tokens.parse_access_token(&token) {
            Err(TokenError::InvalidToken(e)) => {
                assert!(matches!(e.kind(), ErrorKind::ExpiredSignature))
            }
            other => panic!("expected expired token, got {other:?}"),
        }
    }

    #[test]
    fn token_expires_after_its_ttl_elapses() {
        let tokens = manager();
        let token = tokens.new_access_token(7, Duration::seconds(1)).unwrap();
        assert_eq!(tokens.parse_access_token(&token).unwrap(), 7);

        std::thread::sleep(std::time::Duration::from_millis(2100));

        let result = tokens.parse_access_token(&token);
        assert!(matches!(result, Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn refresh_tokens_are_hex_and_unique() {
        let tokens = manager();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let token = tokens.new_refresh_token().unwrap();
            assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(seen.insert(token), "Generated duplicate refresh token");
        }
    }
}
