//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable error description
    #[schema(example = "Incorrect username or password")]
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Greeting returned by the root route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GreetingResponse {
    #[serde(rename = "Hello")]
    #[schema(example = "Welcome to the FastAPI Decorator Builder API!")]
    pub hello: String,
}

impl GreetingResponse {
    pub fn for_title(title: &str) -> Self {
        Self {
            hello: format!("Welcome to the {} API!", title),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
}
