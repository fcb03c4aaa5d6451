use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{mentorships, prelude::*, users};

/// A mentorship entry joined with the member's public profile fields.
#[derive(Debug, Clone)]
pub struct MentorshipEntry {
    pub id: i32,
    pub user_id: i32,
    pub topic: String,
    pub role: String,
    pub created_at: String,
    pub member_name: String,
    pub member_company: String,
    pub member_year: String,
}

pub struct MentorshipRepository {
    conn: DatabaseConnection,
}

impl MentorshipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        topic: &str,
        role: &str,
        created_at: &str,
    ) -> Result<i32> {
        let active = mentorships::ActiveModel {
            user_id: Set(user_id),
            topic: Set(topic.to_string()),
            role: Set(role.to_string()),
            created_at: Set(created_at.to_string()),
            ..Default::default()
        };

        let res = Mentorships::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert mentorship entry")?;

        Ok(res.last_insert_id)
    }

    /// Entries for one role ("mentor" or "mentee"), most recent first.
    pub async fn list_by_role(&self, role: &str) -> Result<Vec<MentorshipEntry>> {
        let rows = Mentorships::find()
            .filter(mentorships::Column::Role.eq(role))
            .find_also_related(Users)
            .order_by_desc(mentorships::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list mentorship entries")?;

        Ok(rows
            .into_iter()
            .map(|(entry, member)| {
                let (member_name, member_company, member_year) = member
                    .map(|u| (u.name, u.company, u.year))
                    .unwrap_or_default();
                MentorshipEntry {
                    id: entry.id,
                    user_id: entry.user_id,
                    topic: entry.topic,
                    role: entry.role,
                    created_at: entry.created_at,
                    member_name,
                    member_company,
                    member_year,
                }
            })
            .collect())
    }
}
