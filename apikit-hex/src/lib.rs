//! # Apikit Hex
//!
//! Application service layer and HTTP adapter for the endpoint layer.
//!
//! ## Architecture
//!
//! - `service/` - Credential service (validation + repository orchestration)
//! - `inbound/` - HTTP adapter (route builder, Basic auth, rate limiting)
//! - `openapi/` - OpenAPI document generated from the registered routes
//!
//! The service is generic over `R: CredentialRepository`, allowing
//! different store implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;


pub use service::CredentialService;
