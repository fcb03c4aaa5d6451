use axum::{
    Form, Json,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user_id;
use super::{ApiError, ApiResponse, AppState, EventDto, flash, take_flash};

#[derive(Deserialize)]
pub struct CreateEventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub location: String,
}

/// GET /create_event
pub async fn create_event_page(session: Session) -> Json<ApiResponse<()>> {
    Json(ApiResponse::with_flash((), take_flash(&session).await))
}

/// POST /create_event
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CreateEventForm>,
) -> Result<Redirect, ApiError> {
    let user_id = current_user_id(&session).await?;

    let title = form.title.trim();
    let description = form.description.trim();
    let date = form.date.trim();

    if title.is_empty() || description.is_empty() || date.is_empty() {
        flash(&session, "Title, description and date are required").await;
        return Ok(Redirect::to("/create_event"));
    }

    state
        .store()
        .create_event(user_id, title, description, date, form.location.trim())
        .await?;

    flash(&session, "Event created").await;
    Ok(Redirect::to("/dashboard"))
}

/// GET /events
/// Full listing with organizer names and attendance, newest date first.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<EventDto>>>, ApiError> {
    let events = state.store().events_with_organizers().await?;
    let dtos: Vec<EventDto> = events.into_iter().map(EventDto::from).collect();

    Ok(Json(ApiResponse::with_flash(
        dtos,
        take_flash(&session).await,
    )))
}

/// POST /rsvp/{event_id}
/// Idempotent from the caller's perspective: a repeat RSVP is a no-op with
/// an informational message, never a hard failure.
pub async fn rsvp(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(event_id): Path<i32>,
) -> Result<Redirect, ApiError> {
    let user_id = current_user_id(&session).await?;

    if state.store().get_event(event_id).await?.is_none() {
        flash(&session, "Event not found").await;
        return Ok(Redirect::to("/events"));
    }

    if state.store().has_rsvp(event_id, user_id).await? {
        flash(&session, "You have already RSVPed").await;
    } else {
        state.store().add_rsvp(event_id, user_id).await?;
        flash(&session, "RSVP successful").await;
    }

    Ok(Redirect::to("/events"))
}
