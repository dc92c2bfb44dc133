//! Tenant scope context and resolution
//!
//! - `scope`: the task-local tenant binding that every scoped data
//!   operation reads.
//! - `resolver`: turns request evidence (explicit selector, bearer token)
//!   into a tenant before any data access occurs.

pub mod resolver;
pub mod scope;

pub use resolver::TenantResolver;
pub use scope::TenantScope;
