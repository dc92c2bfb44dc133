//! Session and token lifecycle
//!
//! Issues access/refresh token pairs, validates and rotates them, and
//! manages single-use password-reset tickets. The ephemeral store is the
//! only source of revocation state: signed tokens are never mutated or
//! blacklisted individually, only the refresh/reset records are.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::error::{Error, Result};
use crate::domain::ports::EphemeralStore;
use crate::domain::types::RoleKey;
use crate::infrastructure::config::Settings;
use crate::infrastructure::constants::RESET_TICKET_BYTES;
use crate::infrastructure::store::{refresh_key, reset_key};
use crate::infrastructure::token::{Claims, TokenCodec, TokenScope};

/// An issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Remaining lifetime of the access token, in seconds
    pub expires_in: u64,
    pub token_type: String,
}

/// Token issuance, validation, rotation, and password reset tickets
pub struct SessionService {
    codec: TokenCodec,
    store: Arc<dyn EphemeralStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    reset_ttl: Duration,
}

impl SessionService {
    pub fn new(settings: &Settings, store: Arc<dyn EphemeralStore>) -> Result<Self> {
        Ok(Self {
            codec: TokenCodec::new(settings)?,
            store,
            access_ttl: settings.access_ttl(),
            refresh_ttl: settings.refresh_ttl(),
            reset_ttl: settings.reset_ticket_ttl(),
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue an access/refresh pair for a user in a tenant.
    ///
    /// Both tokens embed the tenant id and a role snapshot. The refresh
    /// token's liveness record is registered with a TTL equal to its signed
    /// expiry.
    pub async fn issue_pair(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        roles: &[RoleKey],
    ) -> Result<TokenPair> {
        let access = Claims::new(
            TokenScope::Access,
            user_id,
            tenant_id,
            roles.to_vec(),
            self.access_ttl,
            self.codec.issuer(),
            self.codec.audience(),
        );
        let refresh = Claims::new(
            TokenScope::Refresh,
            user_id,
            tenant_id,
            roles.to_vec(),
            self.refresh_ttl,
            self.codec.issuer(),
            self.codec.audience(),
        );

        let access_token = self.codec.encode(&access)?;
        let refresh_token = self.codec.encode(&refresh)?;

        self.store
            .set_ex(
                &refresh_key(&refresh.jti),
                &user_id.to_string(),
                self.refresh_ttl,
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.as_secs(),
            token_type: "bearer".to_string(),
        })
    }

    /// Decode and verify an access token
    pub fn validate_access(&self, token: &str) -> Result<Claims> {
        let claims = self.codec.decode(token)?;
        if claims.scope != TokenScope::Access {
            return Err(Error::invalid_token("wrong token scope"));
        }
        Ok(claims)
    }

    /// Decode and verify a refresh token, then check its liveness record.
    ///
    /// A malformed/expired/wrong-scope token is `InvalidToken`; a valid
    /// token whose liveness record is gone is `TokenRevoked`. The two are
    /// distinct because the caller's recovery differs.
    pub async fn validate_refresh(&self, token: &str) -> Result<Claims> {
        let claims = self.codec.decode(token)?;
        if claims.scope != TokenScope::Refresh {
            return Err(Error::invalid_token("wrong token scope"));
        }

        if !self.store.exists(&refresh_key(&claims.jti)).await? {
            tracing::warn!(jti = %claims.jti, "refresh token presented after revocation");
            return Err(Error::TokenRevoked);
        }

        Ok(claims)
    }

    /// Delete a refresh token's liveness record. Idempotent: revoking an
    /// already-revoked token is a no-op, not an error.
    pub async fn revoke_refresh(&self, token_id: &str) -> Result<()> {
        if token_id.is_empty() {
            return Ok(());
        }
        self.store.del(&refresh_key(token_id)).await
    }

    /// Rotate a validated refresh token: revoke the consumed record and
    /// issue a brand-new pair. Refresh tokens are single-use; the consumed
    /// token fails as revoked from here on.
    pub async fn rotate(&self, consumed: &Claims, roles: &[RoleKey]) -> Result<TokenPair> {
        let tenant_id = consumed.tenant()?;
        self.revoke_refresh(&consumed.jti).await?;
        self.issue_pair(consumed.sub, tenant_id, roles).await
    }

    /// Create a single-use, TTL-bounded password reset ticket
    pub async fn create_reset_ticket(&self, tenant_id: Uuid, user_id: Uuid) -> Result<String> {
        let mut entropy = [0u8; RESET_TICKET_BYTES];
        rand::rng().fill_bytes(&mut entropy);
        let ticket = URL_SAFE_NO_PAD.encode(entropy);

        self.store
            .set_ex(
                &reset_key(&ticket),
                &format!("{tenant_id}:{user_id}"),
                self.reset_ttl,
            )
            .await?;

        Ok(ticket)
    }

    /// Consume a reset ticket, atomically deleting it with the read so that
    /// concurrent redemptions yield exactly one success. Expired and
    /// already-consumed tickets are indistinguishable to the caller.
    pub async fn consume_reset_ticket(&self, ticket: &str) -> Result<(Uuid, Uuid)> {
        let Some(value) = self.store.get_del(&reset_key(ticket)).await? else {
            return Err(Error::TicketExpiredOrConsumed);
        };

        let (tenant, user) = value
            .split_once(':')
            .ok_or_else(|| Error::internal("malformed reset ticket record"))?;

        let tenant_id = Uuid::parse_str(tenant)
            .map_err(|_| Error::internal("malformed tenant id in reset ticket record"))?;
        let user_id = Uuid::parse_str(user)
            .map_err(|_| Error::internal("malformed user id in reset ticket record"))?;

        Ok((tenant_id, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::MemoryStore;

    fn service() -> SessionService {
        SessionService::new(&Settings::default(), Arc::new(MemoryStore::new())).expect("service")
    }

    fn service_with(settings: Settings) -> SessionService {
        SessionService::new(&settings, Arc::new(MemoryStore::new())).expect("service")
    }

    #[tokio::test]
    async fn issued_pair_carries_tenant_and_roles() {
        let sessions = service();
        let (user, tenant) = (Uuid::new_v4(), Uuid::new_v4());

        let pair = sessions
            .issue_pair(user, tenant, &[RoleKey::Admin, RoleKey::Employee])
            .await
            .unwrap();

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 15 * 60);

        let access = sessions.validate_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, user);
        assert_eq!(access.tenant_id, Some(tenant));
        assert_eq!(access.roles, vec![RoleKey::Admin, RoleKey::Employee]);

        let refresh = sessions.validate_refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refresh.sub, user);
    }

    #[tokio::test]
    async fn tokens_are_not_interchangeable_across_scopes() {
        let sessions = service();
        let pair = sessions
            .issue_pair(Uuid::new_v4(), Uuid::new_v4(), &[RoleKey::Employee])
            .await
            .unwrap();

        assert!(matches!(
            sessions.validate_access(&pair.refresh_token),
            Err(Error::InvalidToken { .. })
        ));
        assert!(matches!(
            sessions.validate_refresh(&pair.access_token).await,
            Err(Error::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn rotation_revokes_the_consumed_token() {
        let sessions = service();
        let pair = sessions
            .issue_pair(Uuid::new_v4(), Uuid::new_v4(), &[RoleKey::Employee])
            .await
            .unwrap();

        let consumed = sessions.validate_refresh(&pair.refresh_token).await.unwrap();
        let next = sessions.rotate(&consumed, &[RoleKey::Employee]).await.unwrap();

        // The original refresh token is dead even before its signed expiry.
        assert!(matches!(
            sessions.validate_refresh(&pair.refresh_token).await,
            Err(Error::TokenRevoked)
        ));

        // The replacement works.
        assert!(sessions.validate_refresh(&next.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn revocation_is_idempotent() {
        let sessions = service();
        let pair = sessions
            .issue_pair(Uuid::new_v4(), Uuid::new_v4(), &[RoleKey::Employee])
            .await
            .unwrap();
        let claims = sessions.validate_refresh(&pair.refresh_token).await.unwrap();

        sessions.revoke_refresh(&claims.jti).await.unwrap();
        sessions.revoke_refresh(&claims.jti).await.unwrap();
        sessions.revoke_refresh("").await.unwrap();

        assert!(matches!(
            sessions.validate_refresh(&pair.refresh_token).await,
            Err(Error::TokenRevoked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_liveness_expires_with_the_signed_ttl() {
        let sessions = service_with(Settings {
            refresh_token_ttl_minutes: 1,
            ..Settings::default()
        });

        let pair = sessions
            .issue_pair(Uuid::new_v4(), Uuid::new_v4(), &[RoleKey::Employee])
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        // The liveness record is gone; signature expiry aside, the store
        // alone already rejects the token.
        let result = sessions.validate_refresh(&pair.refresh_token).await;
        assert!(matches!(
            result,
            Err(Error::TokenRevoked) | Err(Error::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn reset_ticket_roundtrip() {
        let sessions = service();
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());

        let ticket = sessions.create_reset_ticket(tenant, user).await.unwrap();
        let consumed = sessions.consume_reset_ticket(&ticket).await.unwrap();

        assert_eq!(consumed, (tenant, user));
    }

    #[tokio::test]
    async fn reset_ticket_is_single_use() {
        let sessions = service();
        let ticket = sessions
            .create_reset_ticket(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        sessions.consume_reset_ticket(&ticket).await.unwrap();

        assert!(matches!(
            sessions.consume_reset_ticket(&ticket).await,
            Err(Error::TicketExpiredOrConsumed)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redemption_yields_exactly_one_success() {
        let sessions = Arc::new(service());
        let ticket = sessions
            .create_reset_ticket(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let sessions = Arc::clone(&sessions);
            let ticket = ticket.clone();
            handles.push(tokio::spawn(async move {
                sessions.consume_reset_ticket(&ticket).await
            }));
        }

        let mut wins = 0;
        let mut losses = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(Error::TicketExpiredOrConsumed) => losses += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(losses, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_ticket_reads_as_consumed() {
        let sessions = service();
        let ticket = sessions
            .create_reset_ticket(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(3601)).await;

        assert!(matches!(
            sessions.consume_reset_ticket(&ticket).await,
            Err(Error::TicketExpiredOrConsumed)
        ));
    }

    #[tokio::test]
    async fn unknown_ticket_reads_as_consumed() {
        let sessions = service();

        assert!(matches!(
            sessions.consume_reset_ticket("never-issued").await,
            Err(Error::TicketExpiredOrConsumed)
        ));
    }
}
