//! Integration tests for route registration and the built-in routes.

mod common;

use apikit_hex::inbound::{ApiConfig, RouteError, RouteOptions};
use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn test_root_route_greets_with_title() {
    let (_dir, api) = builder().await;

    let response = api.router().oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"Hello": "Welcome to the FastAPI Decorator Builder API!"})
    );
}

#[tokio::test]
async fn test_explicit_path_route() {
    let (_dir, mut api) = builder().await;
    api.route("diff", RouteOptions::new(), difference).unwrap();

    let response = api.router().oneshot(get("/diff?a=5&b=2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, 3);
}

#[tokio::test]
async fn test_path_derived_from_function_name() {
    let (_dir, mut api) = builder().await;
    api.route("", RouteOptions::new(), addition).unwrap();

    let response = api.router().oneshot(get("/addition?a=2&b=3")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, 5);
    assert_eq!(api.routes()[0].path, "/addition");
    assert_eq!(api.routes()[0].handler_name, "addition");
}

#[tokio::test]
async fn test_closure_needs_explicit_path() {
    let (_dir, mut api) = builder().await;

    let result = api.route("", RouteOptions::new(), || async { "hi" });

    assert!(matches!(result, Err(RouteError::UnnamedHandler(_))));
}

#[tokio::test]
async fn test_bad_query_is_422() {
    let (_dir, mut api) = builder().await;
    api.route("diff", RouteOptions::new(), difference).unwrap();

    let response = api.router().oneshot(get("/diff?a=five&b=2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (_dir, api) = builder().await;

    let response = api.router().oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Not Found");
}

#[tokio::test]
async fn test_methods_automatic_overrides_route_methods() {
    let (_dir, mut api) = builder().await;
    api.route(
        "diff",
        RouteOptions::new().methods([Method::POST]),
        difference,
    )
    .unwrap();

    assert_eq!(api.routes()[0].methods, vec![Method::GET]);
    let response = api.router().oneshot(get("/diff?a=1&b=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_explicit_methods_when_not_automatic() {
    let (_dir, mut api) = builder().await;
    api.configure(ApiConfig {
        methods_automatic: false,
        ..api.config().clone()
    });
    api.route(
        "diff",
        RouteOptions::new().methods([Method::POST]),
        difference,
    )
    .unwrap();

    let router = api.router();
    let post = Request::builder()
        .method(Method::POST)
        .uri("/diff?a=4&b=1")
        .body(Body::empty())
        .unwrap();

    assert_eq!(router.clone().oneshot(post).await.unwrap().status(), StatusCode::OK);

    let response = router.oneshot(get("/diff?a=4&b=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"detail": "Method Not Allowed"})
    );
}

#[tokio::test]
async fn test_duplicate_route_rejected() {
    let (_dir, mut api) = builder().await;
    api.route("diff", RouteOptions::new(), difference).unwrap();

    let again = api.route("/diff", RouteOptions::new(), addition).map(|_| ());
    let reserved = api.route("health", RouteOptions::new(), addition).map(|_| ());

    assert!(matches!(again, Err(RouteError::Duplicate { ref path, .. }) if path == "/diff"));
    assert!(matches!(reserved, Err(RouteError::Reserved(ref path)) if path == "/health"));
    assert_eq!(api.routes().len(), 1);
}

#[tokio::test]
async fn test_rejected_path_leaves_builder_usable() {
    let (_dir, mut api) = builder().await;
    api.route("users/{id}", RouteOptions::new(), example_route)
        .unwrap();

    let conflict = api
        .route("users/{name}", RouteOptions::new(), example_route)
        .map(|_| ());
    let unbalanced = api.route("a{b", RouteOptions::new(), example_route).map(|_| ());

    assert!(matches!(conflict, Err(RouteError::InvalidPath { .. })));
    assert!(matches!(unbalanced, Err(RouteError::InvalidPath { .. })));

    api.route("diff", RouteOptions::new(), difference).unwrap();
    let router = api.router();

    let response = router.clone().oneshot(get("/users/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = router.oneshot(get("/diff?a=5&b=2")).await.unwrap();
    assert_eq!(json_body(response).await, serde_json::json!(3));
}

#[tokio::test]
async fn test_invalid_rate_spec_rejected() {
    let (_dir, mut api) = builder().await;

    let result = api.route("rate", RouteOptions::new().limit("2/fortnight"), example_route);

    assert!(matches!(result, Err(RouteError::RateLimit(_))));
    assert!(api.routes().is_empty());
}

#[tokio::test]
async fn test_run_server_flag_is_recorded() {
    let (_dir, mut api) = builder().await;
    api.route("diff", RouteOptions::new(), difference).unwrap();
    assert!(!api.wants_server());

    api.route("rate", RouteOptions::new().start_server(), example_route)
        .unwrap();
    assert!(api.wants_server());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (_dir, mut api) = builder().await;
    api.route("", RouteOptions::new(), addition).unwrap();
    api.route("protected", RouteOptions::new().require_auth(), protected_data)
        .unwrap();

    let response = api.router().oneshot(get("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert_eq!(doc["info"]["title"], "FastAPI Decorator Builder");
    assert!(doc["paths"]["/addition"]["get"].is_object());
    assert!(doc["paths"]["/protected"]["get"]["security"].is_array());
}

#[tokio::test]
async fn test_handler_panic_is_json_500() {
    async fn explode() -> &'static str {
        panic!("boom")
    }

    let (_dir, mut api) = builder().await;
    api.route("", RouteOptions::new(), explode).unwrap();

    let response = api.router().oneshot(get("/explode")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["detail"],
        "An internal server error occurred."
    );
}
