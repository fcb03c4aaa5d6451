use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MemberDto, flash, take_flash};

/// Member search results are capped; an unbounded directory dump is not a
/// search.
const SEARCH_LIMIT: u64 = 50;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchView {
    pub query: String,
    pub members: Vec<MemberDto>,
}

/// GET /profile/{user_id}
/// Unknown ids recover locally: back to the landing view with a message.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.store().get_user(user_id).await? {
        Some(user) => Ok(Json(ApiResponse::with_flash(
            MemberDto::from(user),
            take_flash(&session).await,
        ))
        .into_response()),
        None => {
            flash(&session, "User not found").await;
            Ok(Redirect::to("/").into_response())
        }
    }
}

/// GET /search?q=
/// Case-insensitive substring match over name, company and year. A blank
/// query yields an empty result set rather than matching everything.
pub async fn search(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchView>>, ApiError> {
    let q = query.q.trim().to_string();
    let members = state.store().search_users(&q, SEARCH_LIMIT).await?;

    let view = SearchView {
        query: q,
        members: members.into_iter().map(MemberDto::from).collect(),
    };

    Ok(Json(ApiResponse::with_flash(
        view,
        take_flash(&session).await,
    )))
}
