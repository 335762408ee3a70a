//! HTTP Basic authentication middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use apikit_types::{AppError, CredentialRepository, Username};

use super::handlers::ApiError;
use crate::CredentialService;

/// The user authenticated by the Basic auth middleware.
///
/// Add it as a handler argument on routes registered with
/// `RouteOptions::require_auth`. On other routes extraction fails with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Username);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        self.0.as_str()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(ApiError(AppError::Unauthorized))
    }
}

/// Extracts username and password from an Authorization header.
/// Expected format: "Basic base64(<username>:<password>)"
fn extract_basic_credentials(auth_header: Option<&str>) -> Option<(String, String)> {
    let (scheme, encoded) = auth_header?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Authentication middleware for protected routes.
///
/// This middleware:
/// 1. Extracts Basic credentials from the Authorization header
/// 2. Verifies them against the credential store
/// 3. Stores the `AuthenticatedUser` in the request extensions
/// 4. Returns 401 Unauthorized with a Basic challenge otherwise
pub async fn auth_middleware<R: CredentialRepository>(
    State(service): State<Arc<CredentialService<R>>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some((username, password)) = extract_basic_credentials(auth_header) else {
        tracing::debug!("Missing or malformed Basic credentials");
        return ApiError(AppError::Unauthorized).into_response();
    };

    match service.authenticate(&username, &password).await {
        Ok(user) => {
            tracing::debug!(username = %user, "Request authenticated");
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Err(e) => {
            tracing::info!(username = %username, "Authentication failed");
            ApiError(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_extract_basic_credentials() {
        assert_eq!(
            extract_basic_credentials(Some(&basic("alice:secret"))),
            Some(("alice".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_extract_password_with_colon() {
        assert_eq!(
            extract_basic_credentials(Some(&basic("alice:se:cret"))),
            Some(("alice".to_string(), "se:cret".to_string()))
        );
    }

    #[test]
    fn test_extract_scheme_case_insensitive() {
        let header = format!("basic {}", STANDARD.encode("alice:secret"));
        assert!(extract_basic_credentials(Some(&header)).is_some());
    }

    #[test]
    fn test_extract_rejects_other_schemes() {
        assert_eq!(extract_basic_credentials(Some("Bearer sk_test_123")), None);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert_eq!(extract_basic_credentials(None), None);
        assert_eq!(extract_basic_credentials(Some("Basic")), None);
        assert_eq!(extract_basic_credentials(Some("Basic !!!")), None);
        assert_eq!(extract_basic_credentials(Some(&basic("no-colon"))), None);
    }
}
