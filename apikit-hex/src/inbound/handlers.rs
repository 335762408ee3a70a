//! Built-in handlers, error responses and request extractors.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use apikit_types::{AppError, ErrorBody, GreetingResponse, HealthResponse};

/// Detail returned for any internal failure; the cause is only logged.
pub(crate) const INTERNAL_ERROR_DETAIL: &str = "An internal server error occurred.";

/// State shared by the built-in routes.
pub(crate) struct MetaState {
    pub greeting: GreetingResponse,
    pub openapi: utoipa::openapi::OpenApi,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_DETAIL.to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorBody::new(detail))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Basic"),
            );
        }
        response
    }
}

/// Query string extractor that reports bad parameters as 422 JSON errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Params<T>(pub T);

impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(Params(value))
    }
}

/// JSON body extractor that reports malformed payloads as 422 JSON errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Root greeting.
pub(crate) async fn root(State(state): State<Arc<MetaState>>) -> impl IntoResponse {
    Json(state.greeting.clone())
}

/// Health check endpoint.
pub(crate) async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

/// OpenAPI document for the registered routes.
pub(crate) async fn openapi(State(state): State<Arc<MetaState>>) -> impl IntoResponse {
    Json(state.openapi.clone())
}

/// Fallback for unknown paths.
pub(crate) async fn not_found() -> ApiError {
    ApiError(AppError::NotFound("Not Found".into()))
}

/// Fallback for known paths requested with an unsupported method.
pub(crate) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method Not Allowed")),
    )
        .into_response()
}

/// Converts a handler panic into the generic 500 body.
pub(crate) fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(INTERNAL_ERROR_DETAIL)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Operands {
        a: i64,
        b: i64,
    }

    #[tokio::test]
    async fn test_params_rejection_is_validation_error() {
        let request = axum::http::Request::get("/diff?a=1&b=nope")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let err = Params::<Operands>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert!(matches!(err.0, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_json_body_extracts_payload() {
        let request = axum::http::Request::post("/addition")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a": 2, "b": 3}"#))
            .unwrap();

        let JsonBody(ops) = JsonBody::<Operands>::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(ops.a + ops.b, 5);
    }

    #[tokio::test]
    async fn test_json_body_rejection_is_unprocessable() {
        let request = axum::http::Request::post("/addition")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a": 2}"#))
            .unwrap();

        let err = JsonBody::<Operands>::from_request(request, &())
            .await
            .unwrap_err();

        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError(AppError::Unauthorized).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let response = ApiError(AppError::Internal("disk on fire".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
