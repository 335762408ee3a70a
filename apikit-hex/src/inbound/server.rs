//! Route builder and HTTP server startup.
//!
//! `ApiBuilder` accumulates route registrations and forwards them to axum's
//! routing table, layering Basic auth and rate limiting per route.

use std::any::type_name;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    handler::Handler,
    http::Method,
    middleware,
    routing::{self, MethodFilter, MethodRouter, get},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use apikit_types::{CredentialRepository, DomainError, GreetingResponse, RateSpec};

use super::auth::auth_middleware;
use super::handlers::{self, MetaState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::{CredentialService, openapi};

/// Paths served by the builder itself.
const RESERVED_PATHS: [&str; 3] = ["/", "/health", "/openapi.json"];

/// API-wide settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Title used in the root greeting and the OpenAPI document
    pub title: String,
    /// When set, every route uses `default_methods` regardless of its options
    pub methods_automatic: bool,
    /// Methods for routes that do not name their own
    pub default_methods: Vec<Method>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            title: "Apikit".to_string(),
            methods_automatic: true,
            default_methods: vec![Method::GET],
        }
    }
}

/// Per-route registration options.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub methods: Option<Vec<Method>>,
    pub auth_required: bool,
    pub run_server: bool,
    pub rate_limit: Option<String>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Methods to serve (ignored while `methods_automatic` is on).
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Requires HTTP Basic credentials.
    pub fn require_auth(mut self) -> Self {
        self.auth_required = true;
        self
    }

    /// Asks for the server to be started once registration is done.
    pub fn start_server(mut self) -> Self {
        self.run_server = true;
        self
    }

    /// Limits requests per client, e.g. `"2/hour"`.
    pub fn limit(mut self, spec: impl Into<String>) -> Self {
        self.rate_limit = Some(spec.into());
        self
    }
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    pub methods: Vec<Method>,
    pub auth_required: bool,
    pub rate_limit: Option<RateSpec>,
    /// Name of the handler function, used as the OpenAPI operation id
    pub handler_name: String,
}

/// Route registration errors.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Cannot derive a route path from handler '{0}'; pass an explicit path")]
    UnnamedHandler(String),

    #[error("Invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Route {0} has no methods")]
    NoMethods(String),

    #[error("Unsupported method {0}")]
    UnsupportedMethod(Method),

    #[error("Route {method} {path} is already registered")]
    Duplicate { path: String, method: Method },

    #[error("Path {0} is reserved for a built-in endpoint")]
    Reserved(String),

    #[error(transparent)]
    RateLimit(#[from] DomainError),
}

/// Builds an API out of plain handler functions.
///
/// ```ignore
/// let mut api = ApiBuilder::new(CredentialService::new(store));
/// api.route("diff", RouteOptions::new(), difference)?
///     .route("", RouteOptions::new(), addition)?
///     .route("rate", RouteOptions::new().limit("2/hour"), limited)?
///     .route("protected", RouteOptions::new().require_auth(), protected)?;
/// api.run("0.0.0.0:8001").await?;
/// ```
pub struct ApiBuilder<R: CredentialRepository> {
    service: Arc<CredentialService<R>>,
    config: ApiConfig,
    routes: Vec<RouteInfo>,
    router: Router,
    /// Mirrors the paths given to `router` so conflicts surface as errors
    paths: matchit::Router<()>,
    limiters: Vec<Arc<RateLimiterState>>,
    wants_server: bool,
}

impl<R: CredentialRepository> ApiBuilder<R> {
    /// Creates a builder whose protected routes authenticate against `service`.
    pub fn new(service: CredentialService<R>) -> Self {
        let mut paths = matchit::Router::new();
        for path in RESERVED_PATHS {
            // Static, distinct paths always insert.
            let _ = paths.insert(path, ());
        }

        Self {
            service: Arc::new(service),
            config: ApiConfig::default(),
            routes: Vec::new(),
            router: Router::new(),
            paths,
            limiters: Vec::new(),
            wants_server: false,
        }
    }

    /// Replaces the API-wide settings.
    ///
    /// Applies to routes registered afterwards.
    pub fn configure(&mut self, config: ApiConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Routes registered so far, in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Whether a route asked for the server to be started.
    pub fn wants_server(&self) -> bool {
        self.wants_server
    }

    pub fn service(&self) -> &Arc<CredentialService<R>> {
        &self.service
    }

    /// Registers `handler` under `path`.
    ///
    /// An empty path derives the route from the handler's function name, so
    /// `fn addition(..)` is served at `/addition`.
    pub fn route<H, T>(
        &mut self,
        path: &str,
        options: RouteOptions,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let handler_name = handler_name::<H>();
        let path = if path.trim().is_empty() {
            match &handler_name {
                Some(name) => format!("/{}", name),
                None => return Err(RouteError::UnnamedHandler(type_name::<H>().to_string())),
            }
        } else {
            normalize_path(path)?
        };

        let methods = if self.config.methods_automatic {
            self.config.default_methods.clone()
        } else {
            options
                .methods
                .unwrap_or_else(|| self.config.default_methods.clone())
        };
        let filter = method_filter(&path, &methods)?;
        self.check_unique(&path, &methods)?;

        let rate_limit = options
            .rate_limit
            .as_deref()
            .map(RateSpec::parse)
            .transpose()?;

        // Same path, other methods: axum merges into the existing entry.
        if !self.routes.iter().any(|route| route.path == path) {
            self.paths
                .insert(path.as_str(), ())
                .map_err(|e| RouteError::InvalidPath {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut method_router: MethodRouter = routing::on(filter, handler);
        if let Some(spec) = rate_limit {
            let limiter = Arc::new(RateLimiterState::new(spec));
            self.limiters.push(limiter.clone());
            method_router = method_router.layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ));
        }
        // Added last so it runs first: limits only count authenticated calls.
        if options.auth_required {
            method_router = method_router.layer(middleware::from_fn_with_state(
                self.service.clone(),
                auth_middleware::<R>,
            ));
        }

        self.router = std::mem::take(&mut self.router).route(&path, method_router);

        tracing::debug!(
            path = %path,
            methods = ?methods,
            auth_required = options.auth_required,
            rate_limit = ?rate_limit.map(|s| s.to_string()),
            "Route registered"
        );

        self.routes.push(RouteInfo {
            path,
            methods,
            auth_required: options.auth_required,
            rate_limit,
            handler_name: handler_name.unwrap_or_else(|| "anonymous".to_string()),
        });
        self.wants_server |= options.run_server;

        Ok(self)
    }

    fn check_unique(&self, path: &str, methods: &[Method]) -> Result<(), RouteError> {
        if RESERVED_PATHS.contains(&path) {
            return Err(RouteError::Reserved(path.to_string()));
        }

        let taken = self
            .routes
            .iter()
            .filter(|route| route.path == path)
            .flat_map(|route| route.methods.iter())
            .find(|method| methods.contains(method));

        match taken {
            Some(method) => Err(RouteError::Duplicate {
                path: path.to_string(),
                method: method.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Builds the axum router with the built-in and registered routes.
    pub fn router(&self) -> Router {
        let meta = Arc::new(MetaState {
            greeting: GreetingResponse::for_title(&self.config.title),
            openapi: openapi::build(&self.config.title, &self.routes),
        });

        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/openapi.json", get(handlers::openapi))
            .with_state(meta)
            .merge(self.router.clone())
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::method_not_allowed)
            .layer(CatchPanicLayer::custom(handlers::panic_response))
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address with graceful shutdown.
    ///
    /// Consumes the builder, so a server is started at most once.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        tracing::info!(
            title = %self.config.title,
            routes = self.routes.len(),
            "Server listening on {}",
            listener.local_addr()?
        );

        for limiter in &self.limiters {
            limiter.start_cleanup_task();
        }

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Last path segment of the handler's type name, if it names a function.
fn handler_name<H>() -> Option<String> {
    let name = type_name::<H>().rsplit("::").next()?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| name.to_string())
}

fn normalize_path(raw: &str) -> Result<String, RouteError> {
    let path = format!("/{}", raw.trim().trim_start_matches('/'));
    let invalid = |reason: &str| RouteError::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    if path.contains("//") {
        return Err(invalid("empty path segment"));
    }
    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("whitespace in path"));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(invalid("use '{name}' for path parameters"));
    }

    Ok(path)
}

fn method_filter(path: &str, methods: &[Method]) -> Result<MethodFilter, RouteError> {
    let mut filters = methods.iter().map(|method| {
        MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))
    });

    let first = filters
        .next()
        .ok_or_else(|| RouteError::NoMethods(path.to_string()))??;
    filters.try_fold(first, |acc, filter| Ok(acc.or(filter?)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
