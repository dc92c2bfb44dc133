//! Application layer: the orchestrations the request layer invokes

pub mod auth;

pub use auth::{AdminSignup, AuthFlows, RegisterTenantRequest};
