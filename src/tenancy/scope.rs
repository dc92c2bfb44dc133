//! Task-local tenant scope
//!
//! One request owns exactly one scope for its duration. The binding is a
//! `tokio` task-local entered through [`bind`] (or [`bind_sync`] for
//! synchronous sections), which guarantees three things the repository
//! layer depends on:
//!
//! - concurrent tasks never observe each other's binding, including across
//!   await points;
//! - the binding is released on every exit path, normal or panicking;
//! - nested binds restore the exact prior value when the inner future
//!   completes, which is what makes administrative cross-tenant sections
//!   safe to compose.

use std::future::Future;
use uuid::Uuid;

use crate::domain::entities::Tenant;
use crate::domain::error::{Error, Result};

/// The tenant identity bound to the currently executing request/task.
/// Ephemeral: never persisted, destroyed when the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub tenant_slug: String,
}

impl TenantScope {
    pub fn new(tenant_id: Uuid, tenant_slug: &str) -> Self {
        Self {
            tenant_id,
            tenant_slug: tenant_slug.to_string(),
        }
    }

    pub fn of(tenant: &Tenant) -> Self {
        Self::new(tenant.id, &tenant.slug)
    }
}

tokio::task_local! {
    static CURRENT_TENANT: TenantScope;
}

/// Run a future with `scope` bound as the current tenant.
///
/// The previous binding, if any, is restored when the future completes.
pub async fn bind<F>(scope: TenantScope, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_TENANT.scope(scope, fut).await
}

/// Run a closure with `scope` bound as the current tenant
pub fn bind_sync<F, R>(scope: TenantScope, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_TENANT.sync_scope(scope, f)
}

/// The scope bound to the current task, if any
pub fn current() -> Option<TenantScope> {
    CURRENT_TENANT.try_with(Clone::clone).ok()
}

/// The scope bound to the current task, or `MissingTenantScope`
pub fn require() -> Result<TenantScope> {
    current().ok_or(Error::MissingTenantScope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scope(slug: &str) -> TenantScope {
        TenantScope::new(Uuid::new_v4(), slug)
    }

    #[tokio::test]
    async fn no_binding_means_no_scope() {
        assert_eq!(current(), None);
        assert!(matches!(require(), Err(Error::MissingTenantScope)));
    }

    #[tokio::test]
    async fn binding_is_visible_inside_and_gone_after() {
        let acme = scope("acme");

        let observed = bind(acme.clone(), async { current() }).await;

        assert_eq!(observed, Some(acme));
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn nested_binding_restores_the_outer_scope_exactly() {
        let outer = scope("acme");
        let inner = scope("widgets");

        bind(outer.clone(), async {
            assert_eq!(current(), Some(outer.clone()));

            bind(inner.clone(), async {
                assert_eq!(current(), Some(inner.clone()));
            })
            .await;

            assert_eq!(current(), Some(outer.clone()));
        })
        .await;
    }

    #[tokio::test]
    async fn binding_survives_await_points() {
        let acme = scope("acme");

        bind(acme.clone(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(current(), Some(acme.clone()));
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_never_observe_each_other() {
        let mut handles = Vec::new();

        for i in 0..16 {
            let own = scope(&format!("tenant-{i}"));
            handles.push(tokio::spawn(bind(own.clone(), async move {
                for _ in 0..10 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    assert_eq!(current(), Some(own.clone()));
                }
            })));
        }

        for handle in handles {
            handle.await.expect("task should not panic");
        }
    }

    #[tokio::test]
    async fn sync_binding_works_and_releases() {
        let acme = scope("acme");

        let observed = bind_sync(acme.clone(), current);

        assert_eq!(observed, Some(acme));
        assert_eq!(current(), None);
    }
}
