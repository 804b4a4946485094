// Route table with duplicate detection and an authenticated route group

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    handler::Handler,
    http::{Method, Uri},
    middleware::from_fn_with_state,
    routing::{on, MethodFilter},
    Router,
};
use thiserror::Error;
use tracing::debug;

use crate::api::middleware::auth::jwt_auth;
use crate::auth::TokenValidator;
use crate::config::state::AppState;
use crate::utils::api_error::ApiError;

/// Whether a route sits behind the JWT interceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// Startup-time misconfiguration of the route table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route {method} {pattern} is registered more than once")]
    Duplicate { method: Method, pattern: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("path '{pattern}' cannot be both public and protected")]
    MixedAccess { pattern: String },

    #[error("HTTP method {0} cannot be routed")]
    UnsupportedMethod(Method),
}

/// One registered route, as declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: Method,
    pub pattern: String,
    pub access: Access,
}

/// Collects routes into a public and a protected group.
/// The groups become one axum Router, whose matchit tree gives static
/// segments priority over `:param` segments.
pub struct Dispatcher {
    public: Router<AppState>,
    protected: Router<AppState>,
    entries: Vec<RouteEntry>,
    registered: HashSet<(Method, String)>,
    // shape -> (axum path, group)
    paths: HashMap<String, (String, Access)>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            public: Router::new(),
            protected: Router::new(),
            entries: Vec::new(),
            registered: HashSet::new(),
            paths: HashMap::new(),
        }
    }

    /// Registers one route. `pattern` uses `:name` for parameter segments.
    pub fn route<H, T>(
        mut self,
        method: Method,
        pattern: &str,
        handler: H,
        access: Access,
    ) -> Result<Self, RouteError>
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let path: String = to_axum_path(pattern)?;
        let shape: String = path_shape(&path);

        if self.registered.contains(&(method.clone(), shape.clone())) {
            return Err(RouteError::Duplicate { method, pattern: pattern.to_string() });
        }

        match self.paths.get(&shape) {
            Some((existing, _)) if *existing != path => {
                return Err(RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: "parameter names differ from an existing route on the same path",
                });
            }
            Some((_, existing_access)) if *existing_access != access => {
                return Err(RouteError::MixedAccess { pattern: pattern.to_string() });
            }
            _ => {}
        }

        let filter: MethodFilter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;
        self.registered.insert((method.clone(), shape.clone()));

        match access {
            Access::Public => self.public = self.public.route(&path, on(filter, handler)),
            Access::Protected => self.protected = self.protected.route(&path, on(filter, handler)),
        }

        debug!("Registered {:?} route {} {}", access, method, pattern);
        self.paths.insert(shape, (path, access));
        self.entries.push(RouteEntry {
            method,
            pattern: pattern.to_string(),
            access,
        });

        Ok(self)
    }

    /// Routes in registration order
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Builds the final router. Protected routes get the JWT interceptor
    /// as a route layer, so it runs once, after matching and before the
    /// handler. Unknown paths and unregistered methods answer 404.
    pub fn into_router(self, validator: Arc<dyn TokenValidator>) -> Router<AppState> {
        let has_protected: bool = self.entries.iter().any(|e: &RouteEntry| e.access == Access::Protected);

        let mut protected: Router<AppState> = self.protected.method_not_allowed_fallback(not_found);
        if has_protected {
            protected = protected.route_layer(from_fn_with_state(validator, jwt_auth));
        }

        self.public
            .method_not_allowed_fallback(not_found)
            .merge(protected)
            .fallback(not_found)
    }
}

/// Answer for anything the table does not cover
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {} {}", method, uri.path()))
}

/// Converts `/api/rides/:id` into axum's `/api/rides/{id}`
fn to_axum_path(pattern: &str) -> Result<String, RouteError> {
    let invalid = |reason: &'static str| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if !pattern.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if pattern == "/" {
        return Ok(pattern.to_string());
    }

    let mut path: String = String::with_capacity(pattern.len() + 2);
    for segment in pattern[1..].split('/') {
        if segment.is_empty() {
            return Err(invalid("contains an empty segment"));
        }
        if segment.contains(['{', '}', '*']) {
            return Err(invalid("use ':name' for parameter segments"));
        }

        path.push('/');
        match segment.strip_prefix(':') {
            Some("") => return Err(invalid("parameter segment has no name")),
            Some(name) if !name.chars().all(|c: char| c.is_ascii_alphanumeric() || c == '_') => {
                return Err(invalid("parameter names may only contain letters, digits and '_'"));
            }
            Some(name) => {
                path.push('{');
                path.push_str(name);
                path.push('}');
            }
            None => path.push_str(segment),
        }
    }

    Ok(path)
}

/// Path with parameter names erased, so `/a/{id}` and `/a/{rid}` collide
fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment: &str| if segment.starts_with('{') { "{}" } else { segment })
        .collect::<Vec<&str>>()
        .join("/")
}
