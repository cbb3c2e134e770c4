//! JWT issuing and validation
//!
//! Tokens identify a client with `sub = "client:{id}"`. HS* algorithms use a
//! shared secret (`jwt.secret` or `jwt.secret_path`); RS*/ES* algorithms sign
//! with `jwt.private_key_path` and verify with `jwt.public_key_path`.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::JwtConfig;
use crate::error::{Error, Result};
use crate::models::Client;

const CLIENT_SUBJECT_PREFIX: &str = "client:";

/// Message returned when a protected request carries no bearer token
pub const TOKEN_NOT_FOUND: &str = "JWT Token not found";

/// Message returned when a bearer token fails validation
pub const TOKEN_INVALID: &str = "Invalid JWT Token";

/// Message returned when a bearer token is past its expiry
pub const TOKEN_EXPIRED: &str = "Expired JWT Token";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// `client:{id}`
    pub sub: String,

    /// Login name of the client (its email)
    pub username: String,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    /// Numeric client id from the subject
    pub fn client_id(&self) -> Option<i64> {
        self.sub
            .strip_prefix(CLIENT_SUBJECT_PREFIX)
            .and_then(|id| id.parse().ok())
    }
}

/// Issues and validates access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    algorithm: Algorithm,
    validation: Validation,
    ttl_secs: i64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenService {
    /// Load keys and validation rules from configuration
    pub fn from_config(config: &JwtConfig) -> Result<Self> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        let (encoding_key, decoding_key) = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = shared_secret(config)?;
                (
                    EncodingKey::from_secret(&secret),
                    DecodingKey::from_secret(&secret),
                )
            }
            _ => {
                let private_key = read_key("jwt.private_key_path", config.private_key_path.as_deref())?;
                let public_key = read_key("jwt.public_key_path", config.public_key_path.as_deref())?;
                pem_keys(algorithm, &private_key, &public_key)?
            }
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            algorithm,
            validation,
            ttl_secs: i64::try_from(config.token_ttl_secs).unwrap_or(i64::MAX),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Issue a token for `client`
    pub fn issue(&self, client: &Client) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: format!("{}{}", CLIENT_SUBJECT_PREFIX, client.id),
            username: client.email.clone(),
            roles: client.roles(),
            exp: now.saturating_add(self.ttl_secs),
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(client_id = client.id, "Failed to sign JWT: {}", e);
            Error::Internal(format!("Failed to sign JWT: {}", e))
        })
    }

    /// Check signature, expiry, issuer and audience, and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected JWT: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => Error::Unauthorized(TOKEN_EXPIRED.to_string()),
                    _ => Error::Unauthorized(TOKEN_INVALID.to_string()),
                }
            })
    }
}

/// Bearer token from the `Authorization` header
pub fn extract_token(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Unauthorized(TOKEN_NOT_FOUND.to_string()))
}

fn config_error(message: String) -> Error {
    Error::Config(Box::new(figment::Error::from(message)))
}

/// Parse an algorithm name such as `HS256`
pub fn parse_algorithm(alg: &str) -> Result<Algorithm> {
    match alg.to_uppercase().as_str() {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(config_error(format!("Unsupported JWT algorithm: {}", alg))),
    }
}

fn shared_secret(config: &JwtConfig) -> Result<Vec<u8>> {
    if let Some(secret) = &config.secret {
        return Ok(secret.as_bytes().to_vec());
    }

    match &config.secret_path {
        Some(path) => {
            let mut secret = read_key("jwt.secret_path", Some(path))?;
            while secret.last().is_some_and(|b| b.is_ascii_whitespace()) {
                secret.pop();
            }
            Ok(secret)
        }
        None => Err(config_error(format!(
            "JWT algorithm {} needs jwt.secret or jwt.secret_path",
            config.algorithm
        ))),
    }
}

fn read_key(setting: &str, path: Option<&Path>) -> Result<Vec<u8>> {
    let path = path.ok_or_else(|| config_error(format!("{} is not set", setting)))?;
    fs::read(path).map_err(|e| {
        config_error(format!(
            "Failed to read {} '{}': {}",
            setting,
            path.display(),
            e
        ))
    })
}

fn pem_keys(
    algorithm: Algorithm,
    private_key: &[u8],
    public_key: &[u8],
) -> Result<(EncodingKey, DecodingKey)> {
    match algorithm {
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => Ok((
            EncodingKey::from_rsa_pem(private_key)?,
            DecodingKey::from_rsa_pem(public_key)?,
        )),
        Algorithm::ES256 | Algorithm::ES384 => Ok((
            EncodingKey::from_ec_pem(private_key)?,
            DecodingKey::from_ec_pem(public_key)?,
        )),
        other => Err(config_error(format!(
            "Unsupported algorithm for PEM keys: {:?}",
            other
        ))),
    }
}
