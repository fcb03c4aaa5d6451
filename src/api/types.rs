use serde::Serialize;

use crate::db::{Event, EventWithOrganizer, Member, MentorshipEntry, Post, PostWithAuthor};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transient status message flashed by the previous request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub const fn with_flash(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct MemberDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub year: String,
    pub company: String,
    pub bio: String,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            year: member.year,
            company: member.company,
            bio: member.bio,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl From<PostWithAuthor> for PostDto {
    fn from(post: PostWithAuthor) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            created_at: post.created_at,
            author_name: Some(post.author_name),
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            created_at: post.created_at,
            author_name: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventDto {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsvp_count: Option<u64>,
}

impl From<Event> for EventDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            organizer_name: None,
            rsvp_count: None,
        }
    }
}

impl From<EventWithOrganizer> for EventDto {
    fn from(event: EventWithOrganizer) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            organizer_name: Some(event.organizer_name),
            rsvp_count: Some(event.rsvp_count),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MentorshipDto {
    pub id: i32,
    pub user_id: i32,
    pub topic: String,
    pub role: String,
    pub created_at: String,
    pub member_name: String,
    pub member_company: String,
    pub member_year: String,
}

impl From<MentorshipEntry> for MentorshipDto {
    fn from(entry: MentorshipEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            topic: entry.topic,
            role: entry.role,
            created_at: entry.created_at,
            member_name: entry.member_name,
            member_company: entry.member_company,
            member_year: entry.member_year,
        }
    }
}
