//! Signed token codec
//!
//! Compact, claims-bearing tokens carrying the tenant claim, a role
//! snapshot, and the usual registered claims. Tokens are stateless: validity
//! is determined purely by signature and expiry. Refresh tokens additionally
//! have a liveness record in the ephemeral store, managed by the session
//! service, not here.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::error::{Error, Result};
use crate::domain::types::RoleKey;
use crate::infrastructure::config::Settings;

/// Whether a token grants resource access or pair rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Access,
    Refresh,
}

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: Uuid,
    /// Owning tenant. Optional on the wire so foreign tokens decode far
    /// enough for the resolver to reject them with a precise error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    pub scope: TokenScope,
    /// Role snapshot at issuance
    #[serde(default)]
    pub roles: Vec<RoleKey>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// Token id; keys the refresh liveness record
    pub jti: String,
}

impl Claims {
    /// Build claims valid from now for `ttl`
    pub fn new(
        scope: TokenScope,
        subject: Uuid,
        tenant_id: Uuid,
        roles: Vec<RoleKey>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();

        Self {
            sub: subject,
            tenant_id: Some(tenant_id),
            scope,
            roles,
            iat: now,
            nbf: now,
            exp: now + ttl.as_secs() as i64,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    /// The tenant claim, required
    pub fn tenant(&self) -> Result<Uuid> {
        self.tenant_id.ok_or(Error::MissingTenantClaim)
    }
}

/// Signs and verifies claim-bearing tokens.
///
/// Algorithm and signing key come from deployment configuration; issuer,
/// audience, expiry, and not-before are all enforced on decode with zero
/// leeway.
pub struct TokenCodec {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(settings: &Settings) -> Result<Self> {
        let algorithm: Algorithm = settings
            .jwt_algorithm
            .parse()
            .map_err(|_| Error::config(format!("unknown algorithm {}", settings.jwt_algorithm)))?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&settings.jwt_issuer]);
        validation.set_audience(&[&settings.jwt_audience]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        Ok(Self {
            header: Header::new(algorithm),
            encoding: EncodingKey::from_secret(settings.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret_key.as_bytes()),
            validation,
            issuer: settings.jwt_issuer.clone(),
            audience: settings.jwt_audience.clone(),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign claims into a compact token string
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&self.header, claims, &self.encoding)
            .map_err(|e| Error::internal(format!("token signing failed: {e}")))
    }

    /// Verify signature, expiry, not-before, issuer, and audience, returning
    /// the claims. Any failure is `InvalidToken`; scope checks are the
    /// caller's concern.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| Error::invalid_token(e.to_string()))
    }
}
