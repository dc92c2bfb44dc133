//! Authentication flows
//!
//! The orchestrations behind the (excluded) request layer's auth endpoints:
//! tenant registration, login, refresh rotation, logout, and password
//! recovery. Each flow resolves the acting tenant first, binds the tenant
//! scope for its duration, and releases it on every exit path; all data
//! access below runs through the scoped repositories.

use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::Tenant;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{
    BillingGateway, EphemeralStore, ProvisioningEvent, ProvisioningNotifier,
};
use crate::domain::types::{Principal, RoleKey, UserStatus};
use crate::infrastructure::config::Settings;
use crate::repository::Records;
use crate::services::{AuditService, RateLimiter, SessionService, TenantService, TokenPair, UserService};
use crate::tenancy::resolver::TenantResolver;
use crate::tenancy::scope::{self, TenantScope};

/// Admin account details supplied at tenant registration
#[derive(Debug, Clone)]
pub struct AdminSignup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Tenant registration payload
#[derive(Debug, Clone)]
pub struct RegisterTenantRequest {
    pub tenant_name: String,
    pub tenant_slug: String,
    pub contact_email: String,
    pub plan_code: Option<String>,
    pub admin: AdminSignup,
    /// Source address for registration rate limiting
    pub source_ip: Option<String>,
}

/// The auth endpoints' orchestration layer
pub struct AuthFlows {
    settings: Settings,
    sessions: SessionService,
    users: UserService,
    tenants: TenantService,
    audit: AuditService,
    limiter: RateLimiter,
    billing: Arc<dyn BillingGateway>,
    provisioning: Arc<dyn ProvisioningNotifier>,
}

impl AuthFlows {
    pub fn new(
        settings: Settings,
        store: Arc<dyn EphemeralStore>,
        records: &Records,
        billing: Arc<dyn BillingGateway>,
        provisioning: Arc<dyn ProvisioningNotifier>,
    ) -> Result<Self> {
        Ok(Self {
            sessions: SessionService::new(&settings, Arc::clone(&store))?,
            users: UserService::new(records),
            tenants: TenantService::new(records),
            audit: AuditService::new(records),
            limiter: RateLimiter::new(store),
            billing,
            provisioning,
            settings,
        })
    }

    /// Resolve the acting tenant from request evidence
    pub fn resolve_tenant(&self, selector: Option<&str>, bearer: Option<&str>) -> Result<Tenant> {
        TenantResolver::new(&self.tenants, self.sessions.codec()).resolve(selector, bearer)
    }

    /// Register a new tenant with its admin user and issue the first pair
    pub async fn register_tenant(&self, request: RegisterTenantRequest) -> Result<TokenPair> {
        let source = request.source_ip.as_deref().unwrap_or("anonymous");
        self.limiter
            .check_and_increment(
                "register-tenant",
                source,
                self.settings.rate_limit_register_per_hour,
                std::time::Duration::from_secs(3600),
            )
            .await?;

        let mut tenant = self.tenants.create(
            &request.tenant_name,
            &request.tenant_slug,
            &request.contact_email,
        )?;

        let customer = self
            .billing
            .create_customer(
                &request.contact_email,
                &request.tenant_name,
                self.settings.billing_free_trial_days,
            )
            .await?;
        self.tenants.attach_billing_profile(
            &mut tenant,
            &customer,
            Some("trialing"),
            request.plan_code.as_deref(),
        )?;

        scope::bind(TenantScope::of(&tenant), async {
            let admin = self.users.create(
                &request.admin.email,
                &request.admin.password,
                &request.admin.first_name,
                &request.admin.last_name,
                &[RoleKey::Admin, RoleKey::Employee],
            )?;

            self.provisioning
                .publish(&ProvisioningEvent {
                    tenant_id: tenant.id,
                    customer_id: customer.customer_id.clone(),
                    plan_code: request.plan_code.clone(),
                    trial_ends_at: customer.trial_ends_at,
                    metadata: json!({
                        "tenant_slug": tenant.slug,
                        "source_ip": source,
                    }),
                })
                .await?;

            let roles = self.users.roles_of(&admin)?;
            let pair = self.sessions.issue_pair(admin.id, tenant.id, &roles).await?;

            self.audit.log(
                Some(admin.id),
                "tenant.register",
                Some(json!({ "tenant_slug": tenant.slug })),
            )?;

            Ok(pair)
        })
        .await
    }

    /// Authenticate a user of the resolved tenant and issue a pair
    pub async fn login(
        &self,
        selector: Option<&str>,
        bearer: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<TokenPair> {
        let tenant = self.resolve_tenant(selector, bearer)?;

        let identifier = format!("{}:{}", tenant.id, email.to_lowercase());
        self.limiter
            .check_and_increment(
                "login",
                &identifier,
                self.settings.rate_limit_auth_per_minute,
                std::time::Duration::from_secs(60),
            )
            .await?;

        scope::bind(TenantScope::of(&tenant), async {
            let user = self.users.authenticate(email, password)?;
            let roles = self.users.roles_of(&user)?;
            let pair = self.sessions.issue_pair(user.id, tenant.id, &roles).await?;

            self.audit.log(Some(user.id), "auth.login", None)?;

            Ok(pair)
        })
        .await
    }

    /// Rotate a refresh token into a new pair.
    ///
    /// The presented token is consumed; presenting it again afterwards
    /// fails as revoked even before its signed expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.sessions.validate_refresh(refresh_token).await?;

        let tenant = self
            .tenants
            .get_by_id(claims.tenant()?)?
            .ok_or(Error::TenantNotFound)?;

        scope::bind(TenantScope::of(&tenant), async {
            let user = self
                .users
                .get_by_id(claims.sub)?
                .ok_or_else(|| Error::invalid_token("unknown subject"))?;

            let roles = self.users.roles_of(&user)?;
            let pair = self.sessions.rotate(&claims, &roles).await?;

            self.audit.log(Some(user.id), "auth.refresh", None)?;

            Ok(pair)
        })
        .await
    }

    /// Revoke a refresh token for the resolved tenant.
    ///
    /// An already-invalid token is a silent no-op; a valid token belonging
    /// to a different tenant is a mismatch.
    pub async fn logout(
        &self,
        selector: Option<&str>,
        bearer: Option<&str>,
        refresh_token: &str,
    ) -> Result<()> {
        let tenant = self.resolve_tenant(selector, bearer)?;

        let claims = match self.sessions.validate_refresh(refresh_token).await {
            Ok(claims) => claims,
            Err(Error::InvalidToken { .. }) | Err(Error::TokenRevoked) => return Ok(()),
            Err(other) => return Err(other),
        };

        if claims.tenant()? != tenant.id {
            return Err(Error::TenantMismatch);
        }

        self.sessions.revoke_refresh(&claims.jti).await?;

        scope::bind(TenantScope::of(&tenant), async {
            self.audit.log(Some(claims.sub), "auth.logout", None)?;
            Ok(())
        })
        .await
    }

    /// Create a reset ticket for a user of the resolved tenant.
    ///
    /// Returns `None` for an unknown email so callers cannot probe which
    /// addresses exist; delivery of the ticket is the notification layer's
    /// job.
    pub async fn forgot_password(
        &self,
        selector: Option<&str>,
        bearer: Option<&str>,
        email: &str,
    ) -> Result<Option<String>> {
        let tenant = self.resolve_tenant(selector, bearer)?;

        let identifier = format!("{}:{}", tenant.id, email.to_lowercase());
        self.limiter
            .check_and_increment(
                "forgot",
                &identifier,
                self.settings.rate_limit_reset_requests,
                std::time::Duration::from_secs(self.settings.rate_limit_reset_window_seconds),
            )
            .await?;

        scope::bind(TenantScope::of(&tenant), async {
            let Some(user) = self.users.get_by_email(email)? else {
                return Ok(None);
            };

            let ticket = self
                .sessions
                .create_reset_ticket(tenant.id, user.id)
                .await?;

            self.audit.log(
                Some(user.id),
                "auth.forgot_password",
                Some(json!({ "reset_ticket": ticket })),
            )?;

            Ok(Some(ticket))
        })
        .await
    }

    /// Consume a reset ticket and set the user's new password
    pub async fn reset_password(&self, ticket: &str, new_password: &str) -> Result<()> {
        let (tenant_id, user_id) = self.sessions.consume_reset_ticket(ticket).await?;

        let tenant = self
            .tenants
            .get_by_id(tenant_id)?
            .ok_or_else(|| Error::not_found("reset target"))?;

        scope::bind(TenantScope::of(&tenant), async {
            let mut user = self
                .users
                .get_by_id(user_id)?
                .ok_or_else(|| Error::not_found("reset target"))?;

            self.users.set_password(&mut user, new_password)?;
            self.audit.log(Some(user.id), "auth.reset_password", None)?;

            Ok(())
        })
        .await
    }

    /// Resolve the authenticated principal behind an access token
    pub async fn current_principal(
        &self,
        selector: Option<&str>,
        bearer: &str,
    ) -> Result<Principal> {
        let tenant = self.resolve_tenant(selector, Some(bearer))?;

        let claims = self.sessions.validate_access(bearer)?;
        if claims.tenant()? != tenant.id {
            return Err(Error::TenantMismatch);
        }

        scope::bind(TenantScope::of(&tenant), async {
            let user = self
                .users
                .get_by_id(claims.sub)?
                .ok_or_else(|| Error::invalid_token("unknown subject"))?;

            if user.status != UserStatus::Active {
                return Err(Error::UserInactive);
            }

            let roles = self.users.roles_of(&user)?;

            Ok(Principal {
                user_id: user.id,
                tenant_id: tenant.id,
                roles,
                status: user.status,
            })
        })
        .await
    }

    /// Audit entries for the resolved tenant (test and admin support)
    pub fn audit(&self) -> &AuditService {
        &self.audit
    }

    pub fn tenants(&self) -> &TenantService {
        &self.tenants
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }
}
