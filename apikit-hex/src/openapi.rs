//! OpenAPI specification and documentation.
//!
//! Built-in routes are documented through the derive macro; registered
//! routes are appended at router build time since they are only known then.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use axum::http::Method;
use utoipa::{
    Modify, OpenApi,
    openapi::{
        PathItem, RefOr, Response,
        path::{Operation, OperationBuilder},
        security::{Http, HttpAuthScheme, SecurityRequirement, SecurityScheme},
    },
};

use apikit_types::{ErrorBody, GreetingResponse, HealthResponse};

use crate::inbound::RouteInfo;

/// Name of the Basic auth security scheme.
pub const BASIC_AUTH_SCHEME: &str = "basic_auth";

// Dummy functions to generate path documentation

/// Root greeting
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses(
        (status = 200, description = "Greeting", body = GreetingResponse)
    )
)]
async fn root() {}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
async fn health() {}

#[derive(OpenApi)]
#[openapi(
    info(
        description = "Endpoints registered through the apikit route builder.\n\nProtected routes use HTTP Basic authentication against the credential file.",
    ),
    paths(root, health),
    components(schemas(ErrorBody, GreetingResponse, HealthResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "meta", description = "Built-in endpoints"),
        (name = "routes", description = "Registered endpoints"),
    )
)]
struct BaseDoc;

/// Security scheme modifier for Basic authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                BASIC_AUTH_SCHEME,
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// Builds the document for the given title and registered routes.
pub fn build(title: &str, routes: &[RouteInfo]) -> utoipa::openapi::OpenApi {
    let mut doc = BaseDoc::openapi();
    doc.info.title = title.to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();

    for route in routes {
        let item = doc.paths.paths.entry(route.path.clone()).or_default();
        for method in &route.methods {
            set_operation(item, method, operation_for(route));
        }
    }

    doc
}

fn operation_for(route: &RouteInfo) -> Operation {
    let mut builder = OperationBuilder::new()
        .operation_id(Some(route.handler_name.clone()))
        .tag("routes")
        .response("200", RefOr::T(Response::new("Successful response")))
        .response("422", RefOr::T(Response::new("Invalid parameters")));

    if route.auth_required {
        builder = builder
            .security(SecurityRequirement::new(
                BASIC_AUTH_SCHEME,
                Vec::<String>::new(),
            ))
            .response(
                "401",
                RefOr::T(Response::new("Incorrect username or password")),
            );
    }
    if let Some(spec) = route.rate_limit {
        builder = builder
            .description(Some(format!("Rate limited to {} per client.", spec)))
            .response("429", RefOr::T(Response::new("Rate limit exceeded")));
    }

    builder.build()
}

fn set_operation(item: &mut PathItem, method: &Method, operation: Operation) {
    let slot = match method.as_str() {
        "GET" => &mut item.get,
        "POST" => &mut item.post,
        "PUT" => &mut item.put,
        "DELETE" => &mut item.delete,
        "PATCH" => &mut item.patch,
        "HEAD" => &mut item.head,
        "OPTIONS" => &mut item.options,
        "TRACE" => &mut item.trace,
        _ => return,
    };
    *slot = Some(operation);
}
