use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::auth::{AuthError, Principal, TokenService};
use crate::error::ApiError;

/// Name of the body field / query parameter that may carry the token
pub const TOKEN_FIELD: &str = "_token";

/// Request data a guard may inspect
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub path_params: HashMap<String, String>,
}

/// Resolves the key of the resource a request targets (e.g. the username in
/// `/users/:username`)
pub type ResourceKeyExtractor = Arc<dyn Fn(&RequestContext) -> Option<String> + Send + Sync>;

/// Extractor reading a named path parameter
pub fn path_param(name: &'static str) -> ResourceKeyExtractor {
    Arc::new(move |ctx: &RequestContext| ctx.path_params.get(name).cloned())
}

/// One access check, run after the token has been verified
#[derive(Clone)]
pub enum Guard {
    Authenticated,
    Admin,
    Owner(ResourceKeyExtractor),
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::Authenticated => write!(f, "Authenticated"),
            Guard::Admin => write!(f, "Admin"),
            Guard::Owner(_) => write!(f, "Owner(..)"),
        }
    }
}

impl Guard {
    fn check(&self, principal: &Principal, ctx: &RequestContext) -> Result<(), ApiError> {
        match self {
            Guard::Authenticated => Ok(()),
            Guard::Admin if principal.is_privileged => Ok(()),
            Guard::Admin => Err(ApiError::forbidden("admin privileges required")),
            // Ownership mismatch answers 401, not 403
            Guard::Owner(extract) => match extract(ctx) {
                Some(key) if key == principal.subject_id => Ok(()),
                _ => Err(ApiError::unauthorized("unauthorized")),
            },
        }
    }
}

/// Terminal state of the guard pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Proceed(Principal),
    Reject(ApiError),
}

/// Ordered list of guards evaluated by [`GuardChain::evaluate`]
#[derive(Debug, Clone, Default)]
pub struct GuardChain {
    guards: Vec<Guard>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn require_authenticated() -> Self {
        Self::new().then(Guard::Authenticated)
    }

    pub fn require_admin() -> Self {
        Self::require_authenticated().then(Guard::Admin)
    }

    pub fn require_owner(extractor: ResourceKeyExtractor) -> Self {
        Self::require_authenticated().then(Guard::Owner(extractor))
    }

    /// Verify the token, then run each guard in order; the first failure wins.
    pub fn evaluate(&self, tokens: &TokenService, token: Option<&str>, ctx: &RequestContext) -> Decision {
        let Some(token) = token else {
            return Decision::Reject(AuthError::MissingToken.into());
        };

        let principal = match tokens.verify(token) {
            Ok(principal) => principal,
            Err(e) => {
                tracing::warn!("Token verification failed: {}", e);
                return Decision::Reject(e.into());
            }
        };

        for guard in &self.guards {
            if let Err(rejection) = guard.check(&principal, ctx) {
                tracing::debug!(
                    "Guard {:?} rejected '{}': {}",
                    guard,
                    principal.subject_id,
                    rejection
                );
                return Decision::Reject(rejection);
            }
        }

        Decision::Proceed(principal)
    }
}

/// Pick the token from the first place that has a non-empty one: body field,
/// bearer header, then query parameter.
pub fn extract_token(
    body: Option<&Value>,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Option<String> {
    let from_body = body
        .and_then(|b| b.get(TOKEN_FIELD))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let from_header = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };

    let from_query = || query.get(TOKEN_FIELD).filter(|t| !t.is_empty()).cloned();

    from_body.or_else(from_header).or_else(from_query)
}

/// State for [`guard_middleware`]: the chain for one route plus the verifier
#[derive(Clone)]
pub struct GuardState {
    pub tokens: TokenService,
    pub chain: Arc<GuardChain>,
    pub max_body_bytes: usize,
}

impl GuardState {
    pub fn new(tokens: TokenService, chain: GuardChain, max_body_bytes: usize) -> Self {
        Self {
            tokens,
            chain: Arc::new(chain),
            max_body_bytes,
        }
    }
}

/// Runs the route's guard chain; on proceed the principal is inserted into
/// request extensions and the `_token` body field is stripped.
pub async fn guard_middleware(
    State(guard): State<GuardState>,
    path: Option<Path<HashMap<String, String>>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bytes = match to_bytes(body, guard.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::payload_too_large("Request body too large").into_response(),
    };

    let mut json_body: Option<Value> = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };

    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    let token = extract_token(json_body.as_ref(), &parts.headers, &query);

    let ctx = RequestContext {
        path_params: path.map(|Path(p)| p).unwrap_or_default(),
    };

    let principal = match guard.chain.evaluate(&guard.tokens, token.as_deref(), &ctx) {
        Decision::Proceed(principal) => principal,
        Decision::Reject(error) => return error.into_response(),
    };

    tracing::debug!(
        "Request authorized for '{}' (admin={})",
        principal.subject_id,
        principal.is_privileged
    );
    parts.extensions.insert(principal);

    // Handlers never see the token field
    let stripped = json_body
        .as_mut()
        .and_then(Value::as_object_mut)
        .and_then(|obj| obj.remove(TOKEN_FIELD))
        .is_some();

    let body = match (stripped, json_body) {
        (true, Some(value)) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            match serde_json::to_vec(&value) {
                Ok(buf) => Body::from(buf),
                Err(_) => return ApiError::internal_server_error("Failed to re-encode request body").into_response(),
            }
        }
        _ => Body::from(bytes),
    };

    next.run(Request::from_parts(parts, body)).await
}
