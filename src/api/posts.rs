use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user_id;
use super::{ApiError, ApiResponse, AppState, PostDto, flash, take_flash};

#[derive(Deserialize)]
pub struct CreatePostForm {
    pub title: String,
    pub body: String,
}

/// GET /create_post
pub async fn create_post_page(session: Session) -> Json<ApiResponse<()>> {
    Json(ApiResponse::with_flash((), take_flash(&session).await))
}

/// POST /create_post
/// Creates a post owned by the caller, timestamped at the creation instant.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CreatePostForm>,
) -> Result<Redirect, ApiError> {
    let user_id = current_user_id(&session).await?;

    let title = form.title.trim();
    let body = form.body.trim();

    if title.is_empty() || body.is_empty() {
        flash(&session, "Title and body are required").await;
        return Ok(Redirect::to("/create_post"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    state.store().create_post(user_id, title, body, &now).await?;

    flash(&session, "Post created").await;
    Ok(Redirect::to("/dashboard"))
}

/// GET /posts
/// The full feed, most recent first, with author names.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.store().recent_posts(None).await?;
    let dtos: Vec<PostDto> = posts.into_iter().map(PostDto::from).collect();

    Ok(Json(ApiResponse::with_flash(
        dtos,
        take_flash(&session).await,
    )))
}
