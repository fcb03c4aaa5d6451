use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user_id;
use super::{ApiError, ApiResponse, AppState, MentorshipDto, flash, take_flash};

const ROLES: [&str; 2] = ["mentor", "mentee"];

#[derive(Deserialize)]
pub struct MentorshipForm {
    pub topic: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct MentorshipBoard {
    pub mentors: Vec<MentorshipDto>,
    pub mentees: Vec<MentorshipDto>,
}

/// GET /mentorship
pub async fn board(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MentorshipBoard>>, ApiError> {
    let mentors = state.store().mentorships_by_role("mentor").await?;
    let mentees = state.store().mentorships_by_role("mentee").await?;

    let view = MentorshipBoard {
        mentors: mentors.into_iter().map(MentorshipDto::from).collect(),
        mentees: mentees.into_iter().map(MentorshipDto::from).collect(),
    };

    Ok(Json(ApiResponse::with_flash(
        view,
        take_flash(&session).await,
    )))
}

/// POST /mentorship
/// Records one declared interest; a member may hold several entries.
pub async fn declare_interest(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<MentorshipForm>,
) -> Result<Redirect, ApiError> {
    let user_id = current_user_id(&session).await?;

    let topic = form.topic.trim();
    let role = form.role.trim();

    if topic.is_empty() || !ROLES.contains(&role) {
        flash(&session, "Topic and a role of mentor or mentee are required").await;
        return Ok(Redirect::to("/mentorship"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    state
        .store()
        .create_mentorship(user_id, topic, role, &now)
        .await?;

    flash(&session, "Mentorship interest saved").await;
    Ok(Redirect::to("/mentorship"))
}
