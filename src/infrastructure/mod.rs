//! Infrastructure layer: cross-cutting technical concerns.
//!
//! Configuration, logging, password hashing, the signed token codec, the
//! ephemeral store providers, and stub implementations of the external
//! collaborator ports.

pub mod config;
pub mod constants;
pub mod gateways;
pub mod logging;
pub mod password;
pub mod store;
pub mod token;
