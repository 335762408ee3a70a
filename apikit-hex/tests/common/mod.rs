//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use apikit_hex::{
    CredentialService,
    inbound::{ApiBuilder, ApiConfig, AuthenticatedUser, Params},
};
use apikit_store::{FileCredentialStore, HashingCost};
use apikit_types::{CredentialRepository, Username};
use axum::{
    Json,
    body::Body,
    http::{Request, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Deserialize)]
pub struct Operands {
    pub a: i64,
    pub b: i64,
}

pub async fn difference(Params(q): Params<Operands>) -> Json<i64> {
    Json(q.a - q.b)
}

pub async fn addition(Params(q): Params<Operands>) -> Json<i64> {
    Json(q.a + q.b)
}

pub async fn example_route() -> Json<&'static str> {
    Json("Rate-limited route.")
}

pub async fn protected_data(user: AuthenticatedUser) -> Json<String> {
    Json(format!("Hello, {}", user.username()))
}

/// Builder over a fresh credential file holding `alice` / `secret`.
pub async fn builder() -> (TempDir, ApiBuilder<FileCredentialStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileCredentialStore::open_with_cost(
        dir.path().join("user_credentials.json"),
        HashingCost::minimal(),
    )
    .await
    .unwrap();
    store
        .add_user(&Username::parse("alice").unwrap(), "secret")
        .await
        .unwrap();

    let mut api = ApiBuilder::new(CredentialService::new(store));
    api.configure(ApiConfig {
        title: "FastAPI Decorator Builder".to_string(),
        ..ApiConfig::default()
    });
    (dir, api)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_from(uri: &str, client_ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", client_ip)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_basic(uri: &str, username: &str, password: &str) -> Request<Body> {
    let token = STANDARD.encode(format!("{}:{}", username, password));
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Basic {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
