use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::role::{Principal, Role};

/// Lifetime of every issued token.
pub const TOKEN_TTL: TimeDelta = TimeDelta::hours(24);

const SECRET_LEN: usize = 64;

/// Claims
///
/// The payload carried inside every bearer token issued by this service.
/// `role` is a closed enum, so a token naming any other role fails to parse
/// and is reported as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the account username.
    pub sub: String,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: i64,
}

/// Why a presented token was refused. Checks run in the order the variants are
/// declared and the first failing check decides the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("cannot issue a token for an empty identity")]
    EmptyIdentity,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// TokenService
///
/// Issues and validates HS256-signed JWTs. The signing key is held in memory
/// only; a service built with [`TokenService::generate`] invalidates every
/// token it issued once the process exits.
///
/// All methods take `&self` and touch no mutable state, so one instance is
/// shared behind an `Arc` by every request.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenService {
    /// generate
    ///
    /// Builds a service around a fresh random secret drawn from the OS RNG.
    /// Called once at startup.
    pub fn generate() -> Self {
        let mut secret = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret(&secret)
    }

    /// Builds a service around a caller-provided secret. Two services built
    /// from the same secret accept each other's tokens.
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: TOKEN_TTL,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// issue
    ///
    /// Signs a token for `identity` holding `role`, valid for [`TOKEN_TTL`]
    /// from now. Callers must have verified the account's credentials first.
    pub fn issue(&self, identity: &str, role: Role) -> Result<String, IssueError> {
        self.issue_at(identity, role, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with an explicit issuance instant.
    pub fn issue_at(
        &self,
        identity: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, IssueError> {
        if identity.trim().is_empty() {
            return Err(IssueError::EmptyIdentity);
        }

        let claims = Claims {
            sub: identity.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// validate
    ///
    /// Checks, in order:
    /// 1. Structure: three non-empty base64url segments, a parseable HS256
    ///    header and a payload that parses into [`Claims`].
    /// 2. Signature integrity against the process secret.
    /// 3. Expiration (no leeway).
    ///
    /// Never panics on hostile input; every failure is a [`TokenError`].
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        check_structure(token)?;

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(Principal {
            username: data.claims.sub,
            role: data.claims.role,
        })
    }

    /// Validates `token` and returns its subject.
    pub fn extract_identity(&self, token: &str) -> Result<String, TokenError> {
        self.validate(token).map(|principal| principal.username)
    }

    /// Validates `token` and returns its role claim.
    pub fn extract_role(&self, token: &str) -> Result<Role, TokenError> {
        self.validate(token).map(|principal| principal.role)
    }
}

/// Structural pre-check, so that a token which is both unparseable and
/// unsigned is reported as `Malformed` rather than `SignatureInvalid`.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    if payload.is_empty() || signature.is_empty() {
        return Err(TokenError::Malformed);
    }

    let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
    if header.alg != Algorithm::HS256 {
        return Err(TokenError::Malformed);
    }

    URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.sub.trim().is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(())
}
