//! JWT service for token generation and validation
//!
//! Access and refresh tokens are HS256-signed with two distinct secrets and
//! carry the same `{userId, email, tier}` payload. Tokens are stateless:
//! expiry is the only lifecycle control, so verification failures of any
//! kind (bad signature, expired, malformed, wrong class) collapse to `None`.

use anyhow::Result;
use common::{Tier, clock::Clock};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Secret for signing access tokens
    /// - `JWT_REFRESH_SECRET`: Secret for signing refresh tokens
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_REFRESH_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

/// Identity carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub user_id: Uuid,
    pub email: String,
    pub tier: Tier,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: String,
    /// Tier at issuance; live decisions re-read it from storage
    pub tier: Tier,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT service
#[derive(Clone)]
pub struct TokenService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Initialize a new JWT service
    ///
    /// Fails when either secret is empty or both secrets are the same, since
    /// a shared secret would let a refresh token pass as an access token.
    pub fn new(config: JwtConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            anyhow::bail!("JWT secrets must not be empty");
        }
        if config.access_secret == config.refresh_secret {
            anyhow::bail!("JWT_SECRET and JWT_REFRESH_SECRET must differ");
        }

        // Expiry is checked against the injected clock in `verify`
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(TokenService {
            access_encoding_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
            clock,
        })
    }

    /// Generate an access token
    pub fn generate_access_token(&self, payload: &TokenPayload) -> Result<String> {
        self.issue(payload, TokenType::Access)
    }

    /// Generate a refresh token
    pub fn generate_refresh_token(&self, payload: &TokenPayload) -> Result<String> {
        self.issue(payload, TokenType::Refresh)
    }

    /// Generate both tokens for a login or signup
    pub fn generate_token_pair(&self, payload: &TokenPayload) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(payload)?,
            refresh_token: self.generate_refresh_token(payload)?,
        })
    }

    /// Verify an access token
    pub fn verify_token(&self, token: &str) -> Option<TokenPayload> {
        self.verify(token, TokenType::Access)
    }

    /// Verify a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> Option<TokenPayload> {
        self.verify(token, TokenType::Refresh)
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    fn issue(&self, payload: &TokenPayload, token_type: TokenType) -> Result<String> {
        let (lifetime, key) = match token_type {
            TokenType::Access => (self.config.access_token_expiry, &self.access_encoding_key),
            TokenType::Refresh => (self.config.refresh_token_expiry, &self.refresh_encoding_key),
        };
        let lifetime = i64::try_from(lifetime)
            .map_err(|_| anyhow::anyhow!("Token lifetime out of range: {}", lifetime))?;

        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: payload.user_id,
            email: payload.email.clone(),
            tier: payload.tier,
            iat: now,
            exp: now.saturating_add(lifetime),
            token_type,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, key)?;
        Ok(token)
    }

    fn verify(&self, token: &str, expected: TokenType) -> Option<TokenPayload> {
        let key = match expected {
            TokenType::Access => &self.access_decoding_key,
            TokenType::Refresh => &self.refresh_decoding_key,
        };

        let claims = match decode::<Claims>(token, key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("Rejected {:?} token: {}", expected, e);
                return None;
            }
        };

        if claims.token_type != expected {
            debug!("Rejected token: expected {:?}, got {:?}", expected, claims.token_type);
            return None;
        }

        if claims.exp <= self.clock.now().timestamp() {
            debug!("Rejected expired {:?} token for user {}", expected, claims.sub);
            return None;
        }

        Some(TokenPayload {
            user_id: claims.sub,
            email: claims.email,
            tier: claims.tier,
        })
    }
}

/// Pull the token out of an `Authorization` header value
///
/// Only the exact two-part form `Bearer <token>` is accepted.
pub fn extract_token_from_header(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
