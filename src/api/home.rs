use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user_id;
use super::{ApiError, ApiResponse, AppState, EventDto, MemberDto, PostDto, take_flash};

/// Landing view: a short excerpt of the latest activity.
const HOME_POST_LIMIT: u64 = 6;
const HOME_EVENT_LIMIT: u64 = 6;
/// The dashboard shows a shorter event excerpt next to the member's own posts.
const DASHBOARD_EVENT_LIMIT: u64 = 5;

#[derive(Serialize)]
pub struct HomeView {
    pub posts: Vec<PostDto>,
    pub events: Vec<EventDto>,
}

#[derive(Serialize)]
pub struct DashboardView {
    pub user: MemberDto,
    pub posts: Vec<PostDto>,
    pub events: Vec<EventDto>,
}

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<HomeView>>, ApiError> {
    let posts = state.store().recent_posts(Some(HOME_POST_LIMIT)).await?;
    let events = state.store().recent_events(Some(HOME_EVENT_LIMIT)).await?;

    let view = HomeView {
        posts: posts.into_iter().map(PostDto::from).collect(),
        events: events.into_iter().map(EventDto::from).collect(),
    };

    Ok(Json(ApiResponse::with_flash(
        view,
        take_flash(&session).await,
    )))
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let user_id = current_user_id(&session).await?;

    let user = state
        .store()
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let posts = state.store().posts_for_user(user_id).await?;
    let events = state
        .store()
        .recent_events(Some(DASHBOARD_EVENT_LIMIT))
        .await?;

    let view = DashboardView {
        user: MemberDto::from(user),
        posts: posts.into_iter().map(PostDto::from).collect(),
        events: events.into_iter().map(EventDto::from).collect(),
    };

    Ok(Json(ApiResponse::with_flash(
        view,
        take_flash(&session).await,
    )))
}
