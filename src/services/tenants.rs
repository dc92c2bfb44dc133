//! Tenant service
//!
//! Tenant creation with slug normalization and default role provisioning,
//! plus the handful of legitimately cross-tenant lookups: resolving a
//! tenant by its public slug, by id, or by billing customer identifier.
//! Tenants are the partition root, so this service reads the tenant store
//! directly; role provisioning runs before any user or scope exists for the
//! new tenant and therefore uses the audited unscoped path.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use crate::domain::entities::{Role, Tenant};
use crate::domain::error::{Error, Result};
use crate::domain::ports::BillingCustomer;
use crate::domain::types::RoleKey;
use crate::repository::{RecordStore, Records, Repository};

/// Roles provisioned for every new tenant
pub const DEFAULT_ROLES: [(RoleKey, &str); 5] = [
    (RoleKey::Admin, "Administrator"),
    (RoleKey::Manager, "Manager"),
    (RoleKey::Employee, "Employee"),
    (RoleKey::Hr, "Human Resources"),
    (RoleKey::It, "IT"),
];

static SLUG_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("static pattern"));
static SLUG_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("static pattern"));

/// Reduce a requested slug to `[a-z0-9-]`, collapsing runs of dashes and
/// trimming them from the ends. May produce an empty string.
pub fn normalize_slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let replaced = SLUG_INVALID.replace_all(&lowered, "-");
    let collapsed = SLUG_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Encapsulates tenant management logic
#[derive(Clone)]
pub struct TenantService {
    tenants: Arc<dyn RecordStore<Tenant>>,
    roles: Repository<Role>,
}

impl TenantService {
    pub fn new(records: &Records) -> Self {
        Self {
            tenants: records.tenants.clone(),
            roles: Repository::new("roles", records.roles.clone()),
        }
    }

    /// Create a tenant and provision its default roles.
    ///
    /// The slug is normalized here; an empty result is `InvalidTenantSlug`
    /// and a duplicate is `TenantSlugTaken`.
    pub fn create(&self, name: &str, slug: &str, contact_email: &str) -> Result<Tenant> {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return Err(Error::InvalidTenantSlug);
        }
        if self.get_by_slug(&slug)?.is_some() {
            return Err(Error::TenantSlugTaken);
        }

        let tenant = Tenant::new(name, &slug, contact_email);
        self.tenants.insert(tenant.clone())?;

        self.ensure_default_roles(tenant.id)?;

        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant created");
        Ok(tenant)
    }

    /// Provision the default role set for a tenant; existing roles are kept.
    /// Runs before any user exists, hence the unscoped path.
    fn ensure_default_roles(&self, tenant_id: Uuid) -> Result<()> {
        for (key, display_name) in DEFAULT_ROLES {
            let existing = self
                .roles
                .unscoped_find(|r| r.tenant_id == Some(tenant_id) && r.key == key)?;

            if existing.is_empty() {
                self.roles
                    .unscoped_insert(Role::new(tenant_id, key, display_name))?;
            }
        }

        Ok(())
    }

    /// Look up a tenant by its public slug (cross-tenant by nature)
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        Ok(self.tenants.find(&|t| t.slug == slug)?.into_iter().next())
    }

    pub fn get_by_id(&self, tenant_id: Uuid) -> Result<Option<Tenant>> {
        self.tenants.get(tenant_id)
    }

    /// Look up a tenant by the identifier the billing provider knows it by
    pub fn get_by_billing_customer_id(&self, customer_id: &str) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .find(&|t| t.billing_customer_id.as_deref() == Some(customer_id))?
            .into_iter()
            .next())
    }

    /// Attach the billing identity returned by the provider
    pub fn attach_billing_profile(
        &self,
        tenant: &mut Tenant,
        customer: &BillingCustomer,
        subscription_status: Option<&str>,
        plan_code: Option<&str>,
    ) -> Result<()> {
        tenant.billing_customer_id = Some(customer.customer_id.clone());
        tenant.billing_provider = Some(customer.payment_provider.clone());
        tenant.subscription_status = subscription_status.map(str::to_string);
        tenant.plan_code = plan_code.map(str::to_string);
        tenant.trial_ends_at = customer.trial_ends_at;

        self.tenants.update(tenant.clone())
    }

    /// Record a subscription status change reported by the billing provider
    pub fn update_subscription_status(
        &self,
        tenant: &mut Tenant,
        status: &str,
        plan_code: Option<&str>,
    ) -> Result<()> {
        tenant.subscription_status = Some(status.to_string());
        if let Some(plan) = plan_code {
            tenant.plan_code = Some(plan.to_string());
        }

        self.tenants.update(tenant.clone())
    }
}
