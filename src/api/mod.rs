use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod events;
mod home;
mod members;
mod mentorship;
mod posts;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

/// Session keys: the opaque session cookie maps to exactly one member.
pub const SESSION_USER_ID: &str = "user_id";
pub const SESSION_USER_NAME: &str = "user_name";

const FLASH_KEY: &str = "flash";

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState { shared }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

/// Stash a one-shot status message; the redirect-after-write convention
/// attaches it to the next rendered response.
pub(crate) async fn flash(session: &Session, message: impl Into<String>) {
    let _ = session.insert(FLASH_KEY, message.into()).await;
}

/// Take (and clear) the pending flash message, if any.
pub(crate) async fn take_flash(session: &Session) -> Option<String> {
    session.remove::<String>(FLASH_KEY).await.ok().flatten()
}

pub async fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;
    let cors_origins = server.cors_allowed_origins.clone();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_expiry_minutes,
        )));

    let app_router = Router::new()
        .route("/", get(home::index))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/profile/{user_id}", get(members::profile))
        .route("/posts", get(posts::list_posts))
        .route("/events", get(events::list_events))
        .route("/search", get(members::search))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .merge(guarded_router())
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app_router
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Routes that require an authenticated session. The guard redirects
/// anonymous requests to the login entry point, preserving the original
/// destination so login can resume there.
fn guarded_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(home::dashboard))
        .route(
            "/create_post",
            get(posts::create_post_page).post(posts::create_post),
        )
        .route(
            "/create_event",
            get(events::create_event_page).post(events::create_event),
        )
        .route("/rsvp/{event_id}", post(events::rsvp))
        .route(
            "/mentorship",
            get(mentorship::board).post(mentorship::declare_interest),
        )
        .route_layer(middleware::from_fn(auth::require_login))
}
