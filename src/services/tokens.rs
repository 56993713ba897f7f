// SPDX-License-Identifier: MIT

//! JWT access/refresh token pairs.
//!
//! Tokens are HS256 and carry `sub` (user id) plus a `token_type`
//! discriminator so an access token can never be exchanged as a refresh
//! token. Access tokens additionally carry the `username` claim.
//!
//! `peek_subject` decodes a token WITHOUT validating signature or expiry.
//! The refresh guard uses it to look the subject up (existence and block
//! checks) before the full validation runs as the final step.

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// "access" or "refresh"
    pub token_type: String,
    /// Username claim, present on access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// An access/refresh token pair, as returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies token pairs for user sessions.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_signing_key),
            decoding_key: DecodingKey::from_secret(&config.jwt_signing_key),
            access_lifetime_secs: config.access_token_lifetime_secs,
            refresh_lifetime_secs: config.refresh_token_lifetime_secs,
        }
    }

    /// Issue a fresh access/refresh pair for a user.
    ///
    /// The caller is responsible for the block check; this only mints
    /// tokens from the identity it is given.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = chrono::Utc::now().timestamp();

        let access = self.sign(Claims {
            sub: user.id.to_string(),
            iat: now as usize,
            exp: (now + self.access_lifetime_secs) as usize,
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            username: Some(user.username.clone()),
        })?;

        let refresh = self.sign(Claims {
            sub: user.id.to_string(),
            iat: now as usize,
            exp: (now + self.refresh_lifetime_secs) as usize,
            token_type: TOKEN_TYPE_REFRESH.to_string(),
            username: None,
        })?;

        Ok(TokenPair { access, refresh })
    }

    fn sign(&self, claims: Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    /// Fully validate an access token (signature, expiry, token type).
    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        self.verify(token, TOKEN_TYPE_ACCESS)
    }

    /// Fully validate a refresh token (signature, expiry, token type).
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        self.verify(token, TOKEN_TYPE_REFRESH)
    }

    fn verify(&self, token: &str, expected_type: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        if data.claims.token_type != expected_type {
            return Err(AppError::InvalidToken);
        }

        Ok(data.claims)
    }

    /// Decode a token's subject without validating signature or expiry.
    ///
    /// Fails only when the payload is structurally undecodable or the
    /// subject is not a user id.
    pub fn peek_subject(&self, token: &str) -> Result<i64, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|_| AppError::InvalidToken)?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidToken)
    }
}
