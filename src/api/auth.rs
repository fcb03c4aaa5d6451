use axum::{
    Form, Json,
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use tower_sessions::Session;
use tracing::info;

use super::{
    ApiError, ApiResponse, AppState, SESSION_USER_ID, SESSION_USER_NAME, flash, take_flash,
};
use crate::db::{NewMember, hash_password};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Destination preserved by the access guard, resumed after login.
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct LoginPage {
    pub next: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Access guard applied at route registration: requests without a valid
/// session are redirected to the login entry point with the original
/// destination preserved in the `next` parameter.
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    if let Ok(Some(_user_id)) = session.get::<i32>(SESSION_USER_ID).await {
        return next.run(request).await;
    }

    let destination = request
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

    Redirect::to(&format!(
        "/login?next={}",
        urlencoding::encode(&destination)
    ))
    .into_response()
}

/// Login resume targets must be local paths; anything else falls back to
/// the dashboard so the login flow can't bounce off-site.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/dashboard".to_string(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /register
pub async fn register_page(session: Session) -> Json<ApiResponse<()>> {
    Json(ApiResponse::with_flash((), take_flash(&session).await))
}

/// POST /register
/// Creates a member with a hashed password. Duplicate emails are a no-op
/// that points the caller at login instead.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        flash(&session, "Name, email and password are required").await;
        return Ok(Redirect::to("/register"));
    }

    if state.store().get_user_by_email(&email).await?.is_some() {
        flash(&session, "Email already registered. Please login.").await;
        return Ok(Redirect::to("/login"));
    }

    // Argon2 is CPU-intensive; keep it off the async runtime.
    let security = state.config().security.clone();
    let password = form.password;
    let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task panicked: {e}")))??;

    state
        .store()
        .create_user(NewMember {
            name,
            email: email.clone(),
            password_hash,
            year: form.year.trim().to_string(),
            company: form.company.trim().to_string(),
            bio: form.bio.trim().to_string(),
        })
        .await?;

    info!("Registered new member: {email}");

    flash(&session, "Registration successful. Please login.").await;
    Ok(Redirect::to("/login"))
}

/// GET /login
pub async fn login_page(
    session: Session,
    Query(query): Query<NextQuery>,
) -> Json<ApiResponse<LoginPage>> {
    Json(ApiResponse::with_flash(
        LoginPage { next: query.next },
        take_flash(&session).await,
    ))
}

/// POST /login
/// A failed login never reveals whether the email or the password was wrong.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    let email = form.email.trim().to_lowercase();

    let is_valid = state
        .store()
        .verify_user_password(&email, &form.password)
        .await?;

    if is_valid {
        let user = state
            .store()
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        session
            .insert(SESSION_USER_ID, user.id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
        session
            .insert(SESSION_USER_NAME, &user.name)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

        flash(&session, "Logged in successfully").await;
        return Ok(Redirect::to(&safe_next(form.next.as_deref())));
    }

    flash(&session, "Invalid credentials").await;
    Ok(Redirect::to("/login"))
}

/// GET /logout
/// Unconditionally drops the authenticated identity.
pub async fn logout(session: Session) -> Redirect {
    session.clear().await;
    flash(&session, "Logged out").await;
    Redirect::to("/")
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the member id from the session; the guard makes this infallible on
/// guarded routes, but handlers still treat absence as unauthorized.
pub(crate) async fn current_user_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_USER_ID)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_defaults_to_dashboard() {
        assert_eq!(safe_next(None), "/dashboard");
        assert_eq!(safe_next(Some("")), "/dashboard");
    }

    #[test]
    fn next_accepts_local_paths_only() {
        assert_eq!(safe_next(Some("/events")), "/events");
        assert_eq!(safe_next(Some("/mentorship?tab=mentors")), "/mentorship?tab=mentors");
        assert_eq!(safe_next(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_next(Some("//evil.example")), "/dashboard");
    }
}
