//! Tenant resolution from request evidence
//!
//! Determines the acting tenant before any data access occurs, from an
//! optional explicit tenant selector (slug) and an optional bearer token.
//! The lookups here are inherently cross-tenant and go through the tenant
//! directory, never through scoped repositories.

use crate::domain::entities::Tenant;
use crate::domain::error::{Error, Result};
use crate::infrastructure::token::TokenCodec;
use crate::services::tenants::TenantService;

/// Resolves the acting tenant for one request
pub struct TenantResolver<'a> {
    tenants: &'a TenantService,
    codec: &'a TokenCodec,
}

impl<'a> TenantResolver<'a> {
    pub fn new(tenants: &'a TenantService, codec: &'a TokenCodec) -> Self {
        Self { tenants, codec }
    }

    /// Resolve the tenant from an explicit selector and/or a bearer token.
    ///
    /// - Selector present: the tenant is looked up by slug; a bearer token,
    ///   if also present, must carry a matching tenant claim.
    /// - Only a bearer token: its tenant claim names the tenant.
    /// - Neither: the request carries no tenant identity at all.
    ///
    /// The caller binds the returned tenant as the scope for the remainder
    /// of the request and releases it on completion.
    pub fn resolve(&self, selector: Option<&str>, bearer: Option<&str>) -> Result<Tenant> {
        match (selector, bearer) {
            (Some(slug), bearer) => {
                let tenant = self
                    .tenants
                    .get_by_slug(slug)?
                    .ok_or(Error::TenantNotFound)?;

                if let Some(token) = bearer {
                    let claims = self.codec.decode(token)?;
                    if let Some(claimed) = claims.tenant_id {
                        if claimed != tenant.id {
                            return Err(Error::TenantMismatch);
                        }
                    }
                }

                Ok(tenant)
            }
            (None, Some(token)) => {
                let claims = self.codec.decode(token)?;
                let tenant_id = claims.tenant()?;

                self.tenants
                    .get_by_id(tenant_id)?
                    .ok_or(Error::TenantNotFound)
            }
            (None, None) => Err(Error::MissingTenantIdentifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RoleKey;
    use crate::infrastructure::config::Settings;
    use crate::infrastructure::token::{Claims, TokenScope};
    use crate::repository::Records;
    use std::time::Duration;
    use uuid::Uuid;

    struct Fixture {
        tenants: TenantService,
        codec: TokenCodec,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tenants: TenantService::new(&Records::in_memory()),
                codec: TokenCodec::new(&Settings::default()).expect("codec"),
            }
        }

        fn token_for(&self, tenant_id: Option<Uuid>) -> String {
            let mut claims = Claims::new(
                TokenScope::Access,
                Uuid::new_v4(),
                tenant_id.unwrap_or_else(Uuid::new_v4),
                vec![RoleKey::Employee],
                Duration::from_secs(600),
                "tenantry",
                "tenantry-clients",
            );
            claims.tenant_id = tenant_id;
            self.codec.encode(&claims).expect("encode")
        }
    }

    #[test]
    fn selector_alone_resolves_by_slug() {
        let fx = Fixture::new();
        let tenant = fx.tenants.create("Acme", "acme", "owner@acme.io").unwrap();

        let resolved = TenantResolver::new(&fx.tenants, &fx.codec)
            .resolve(Some("acme"), None)
            .unwrap();

        assert_eq!(resolved.id, tenant.id);
    }

    #[test]
    fn unknown_selector_is_tenant_not_found() {
        let fx = Fixture::new();

        let result = TenantResolver::new(&fx.tenants, &fx.codec).resolve(Some("ghost"), None);

        assert!(matches!(result, Err(Error::TenantNotFound)));
    }

    #[test]
    fn selector_with_foreign_token_is_a_mismatch() {
        let fx = Fixture::new();
        fx.tenants.create("Acme", "acme", "owner@acme.io").unwrap();
        let widgets = fx.tenants.create("Widgets", "widgets", "w@widgets.io").unwrap();

        let token = fx.token_for(Some(widgets.id));
        let result =
            TenantResolver::new(&fx.tenants, &fx.codec).resolve(Some("acme"), Some(&token));

        assert!(matches!(result, Err(Error::TenantMismatch)));
    }

    #[test]
    fn selector_with_matching_token_resolves() {
        let fx = Fixture::new();
        let acme = fx.tenants.create("Acme", "acme", "owner@acme.io").unwrap();

        let token = fx.token_for(Some(acme.id));
        let resolved = TenantResolver::new(&fx.tenants, &fx.codec)
            .resolve(Some("acme"), Some(&token))
            .unwrap();

        assert_eq!(resolved.id, acme.id);
    }

    #[test]
    fn bearer_alone_resolves_from_its_claim() {
        let fx = Fixture::new();
        let acme = fx.tenants.create("Acme", "acme", "owner@acme.io").unwrap();

        let token = fx.token_for(Some(acme.id));
        let resolved = TenantResolver::new(&fx.tenants, &fx.codec)
            .resolve(None, Some(&token))
            .unwrap();

        assert_eq!(resolved.id, acme.id);
    }

    #[test]
    fn bearer_without_tenant_claim_is_rejected() {
        let fx = Fixture::new();

        let token = fx.token_for(None);
        let result = TenantResolver::new(&fx.tenants, &fx.codec).resolve(None, Some(&token));

        assert!(matches!(result, Err(Error::MissingTenantClaim)));
    }

    #[test]
    fn bearer_naming_an_unknown_tenant_is_not_found() {
        let fx = Fixture::new();

        let token = fx.token_for(Some(Uuid::new_v4()));
        let result = TenantResolver::new(&fx.tenants, &fx.codec).resolve(None, Some(&token));

        assert!(matches!(result, Err(Error::TenantNotFound)));
    }

    #[test]
    fn no_evidence_at_all_is_rejected() {
        let fx = Fixture::new();

        let result = TenantResolver::new(&fx.tenants, &fx.codec).resolve(None, None);

        assert!(matches!(result, Err(Error::MissingTenantIdentifier)));
    }

    #[test]
    fn garbage_bearer_is_invalid_token() {
        let fx = Fixture::new();
        fx.tenants.create("Acme", "acme", "owner@acme.io").unwrap();

        let result = TenantResolver::new(&fx.tenants, &fx.codec)
            .resolve(Some("acme"), Some("not.a.token"));

        assert!(matches!(result, Err(Error::InvalidToken { .. })));
    }
}
