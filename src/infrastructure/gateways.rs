//! Stub providers for the billing and provisioning ports
//!
//! Used when no real provider is configured, and by tests. The stubs mirror
//! what a deployment without credentials does: fabricate a customer id,
//! log the event, and move on.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::domain::error::Result;
use crate::domain::ports::{BillingCustomer, BillingGateway, ProvisioningEvent, ProvisioningNotifier};

/// Billing gateway that fabricates customer records locally
#[derive(Debug, Default)]
pub struct StubBillingGateway;

#[async_trait]
impl BillingGateway for StubBillingGateway {
    async fn create_customer(
        &self,
        email: &str,
        name: &str,
        trial_days: u32,
    ) -> Result<BillingCustomer> {
        let customer_id = format!("stub_{}", &Uuid::new_v4().simple().to_string()[..12]);
        let trial_ends_at = (trial_days > 0)
            .then(|| Utc::now() + ChronoDuration::days(i64::from(trial_days)));

        tracing::info!(%customer_id, name, "stub billing customer created");

        Ok(BillingCustomer {
            customer_id,
            email: email.to_string(),
            payment_provider: "stub".to_string(),
            trial_ends_at,
        })
    }
}

/// Provisioning notifier that logs events instead of publishing them
#[derive(Debug, Default)]
pub struct LogProvisioningNotifier;

#[async_trait]
impl ProvisioningNotifier for LogProvisioningNotifier {
    async fn publish(&self, event: &ProvisioningEvent) -> Result<()> {
        let message = serde_json::to_string(event)?;
        tracing::info!(
            tenant_id = %event.tenant_id,
            customer_id = %event.customer_id,
            %message,
            "provisioning event (no publisher configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_billing_fabricates_customers() {
        let gateway = StubBillingGateway;

        let customer = gateway
            .create_customer("owner@acme.io", "Acme", 7)
            .await
            .unwrap();

        assert!(customer.customer_id.starts_with("stub_"));
        assert_eq!(customer.payment_provider, "stub");
        assert!(customer.trial_ends_at.is_some());
    }

    #[tokio::test]
    async fn zero_trial_days_means_no_trial_end() {
        let gateway = StubBillingGateway;

        let customer = gateway
            .create_customer("owner@acme.io", "Acme", 0)
            .await
            .unwrap();

        assert!(customer.trial_ends_at.is_none());
    }
}
