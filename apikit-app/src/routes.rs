//! Demo endpoints registered through the route builder.

use axum::Json;
use serde::Deserialize;

use apikit_hex::inbound::{ApiBuilder, AuthenticatedUser, Params, RouteError, RouteOptions};
use apikit_types::CredentialRepository;

/// Query parameters of the arithmetic endpoints.
#[derive(Debug, Deserialize)]
pub struct Operands {
    pub a: i64,
    pub b: i64,
}

/// Endpoint to subtract two integers.
pub async fn difference(Params(q): Params<Operands>) -> Json<i64> {
    Json(q.a.wrapping_sub(q.b))
}

/// Endpoint to add two integers.
pub async fn addition(Params(q): Params<Operands>) -> Json<i64> {
    Json(q.a.wrapping_add(q.b))
}

/// Allows only 2 requests per hour from the same client.
pub async fn example_route() -> Json<&'static str> {
    Json("Rate-limited route.")
}

/// Provides access to authenticated users only.
pub async fn protected_data(user: AuthenticatedUser) -> Json<String> {
    Json(format!("Hello, {}", user.username()))
}

/// Registers every demo endpoint.
pub fn register<R: CredentialRepository>(api: &mut ApiBuilder<R>) -> Result<(), RouteError> {
    api.route("diff", RouteOptions::new(), difference)?
        .route("", RouteOptions::new(), addition)?
        .route("rate", RouteOptions::new().limit("2/hour"), example_route)?
        .route(
            "protected",
            RouteOptions::new().require_auth().start_server(),
            protected_data,
        )?;
    Ok(())
}
