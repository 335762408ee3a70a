//! HTTP Inbound Adapter
//!
//! Axum-based route builder that turns plain handler functions into
//! endpoints with optional Basic authentication and rate limiting.

mod auth;
mod handlers;
mod rate_limit;
mod server;

pub use auth::AuthenticatedUser;
pub use handlers::{ApiError, JsonBody, Params};
pub use rate_limit::RateLimiterState;
pub use server::{ApiBuilder, ApiConfig, RouteError, RouteInfo, RouteOptions};
