use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{companies, health, jobs, login, users};
use crate::middleware::{guard_middleware, path_param, GuardChain, GuardState};
use crate::services::{CompanyService, JobService, UserService};

/// Everything a handler needs, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub tokens: TokenService,
    pub companies: CompanyService,
    pub jobs: JobService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        Self {
            tokens: TokenService::new(&config.security),
            companies: CompanyService::new(pool.clone()),
            jobs: JobService::new(pool.clone()),
            users: UserService::new(pool.clone(), config.security.bcrypt_cost),
            config: Arc::new(config),
            pool,
        }
    }

    fn guard(&self, chain: GuardChain) -> GuardState {
        GuardState::new(self.tokens.clone(), chain, self.config.api.max_request_size_bytes)
    }
}

/// Build the full router. Routes are grouped by access tier; each tier router
/// carries its own guard chain and the tiers are merged by path.
pub fn app(state: AppState) -> Router {
    let public_listings = state.config.api.public_listings;

    let mut public = Router::new()
        .route("/health", get(health::get))
        .route("/login", post(login::post))
        .route("/users", post(users::post));

    let mut authenticated = Router::new()
        .route("/users", get(users::list))
        .route("/users/:username", get(users::get))
        .route("/jobs/:id/apply", post(jobs::apply));

    let listings = Router::new()
        .route("/companies", get(companies::list))
        .route("/companies/:handle", get(companies::get))
        .route("/jobs", get(jobs::list))
        .route("/jobs/:id", get(jobs::get));

    if public_listings {
        public = public.merge(listings);
    } else {
        authenticated = authenticated.merge(listings);
    }

    let authenticated = authenticated.route_layer(from_fn_with_state(
        state.guard(GuardChain::require_authenticated()),
        guard_middleware,
    ));

    let admin = Router::new()
        .route("/companies", post(companies::post))
        .route("/companies/:handle", patch(companies::patch).delete(companies::delete))
        .route("/jobs", post(jobs::post))
        .route("/jobs/:id", patch(jobs::patch).delete(jobs::delete))
        .route_layer(from_fn_with_state(
            state.guard(GuardChain::require_admin()),
            guard_middleware,
        ));

    let owner = Router::new()
        .route("/users/:username", patch(users::patch).delete(users::delete))
        .route_layer(from_fn_with_state(
            state.guard(GuardChain::require_owner(path_param("username"))),
            guard_middleware,
        ));

    let mut router = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .merge(owner);

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
