//! Domain models for the endpoint layer.

pub mod credential;
pub mod rate;

pub use credential::{CredentialRecord, Username};
pub use rate::{RateSpec, RateUnit};
