//! # Apikit Types
//!
//! Domain types and port traits for the apikit endpoint layer.
//! This crate has ZERO IO dependencies - only data structures,
//! validation rules, and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Pure domain types (Username, CredentialRecord, RateSpec)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, store and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{CredentialRecord, RateSpec, RateUnit, Username};
pub use dto::*;
pub use error::{AppError, DomainError, StoreError};
pub use ports::CredentialRepository;
