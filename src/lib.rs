//! Tenant isolation and credential lifecycle core for multi-tenant backends.
//!
//! Every data access against a tenant-owned record is implicitly scoped to
//! exactly one tenant, and access/refresh/reset credentials are managed
//! against a shared revocation store. The HTTP layer, the relational engine,
//! and billing/provisioning providers live outside this crate and talk to it
//! through the ports in [`domain::ports`] and the flows in
//! [`application::auth`].

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod repository;
pub mod services;
pub mod tenancy;
