// JWT issuing, validation and revocation

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::identity::{AuthError, Identity};
use crate::models::User;

const ISSUER: &str = "juno-backend";
const LEEWAY_SECONDS: u64 = 5;

/// Validates bearer credentials for the protected route group
#[async_trait]
pub trait TokenValidator: Send + Sync + 'static {
    async fn validate(&self, token: &str) -> Result<Identity, AuthError>;

    /// Makes the token behind `identity` unusable until it expires
    async fn revoke(&self, identity: &Identity);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    name: String,
    jti: String,
    iss: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 tokens with an in-memory revocation list keyed by `jti`
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    // jti -> exp (unix seconds)
    revoked: DashMap<String, i64>,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation: Validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = LEEWAY_SECONDS;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            revoked: DashMap::new(),
        }
    }

    /// Signs a session token for `user`
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let now: DateTime<Utc> = Utc::now();
        let expires_at: DateTime<Utc> = now + self.ttl;

        let claims: Claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            jti: Uuid::new_v4().to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token: String = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Drops revocations for tokens that would be expired anyway
    fn prune_revoked(&self, now: i64) {
        self.revoked.retain(|_, exp: &mut i64| *exp > now);
    }
}

#[async_trait]
impl TokenValidator for JwtService {
    async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims: Claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    debug!("Rejected token: {}", e);
                    AuthError::InvalidToken
                }
            })?
            .claims;

        if self.revoked.contains_key(&claims.jti) {
            return Err(AuthError::Revoked);
        }

        let expires_at: DateTime<Utc> = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::InvalidToken)?;

        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            token_id: claims.jti,
            expires_at,
        })
    }

    async fn revoke(&self, identity: &Identity) {
        let now: i64 = Utc::now().timestamp();
        self.prune_revoked(now);
        self.revoked
            .insert(identity.token_id.clone(), identity.expires_at.timestamp());
    }
}
