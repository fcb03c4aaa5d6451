use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{events, prelude::*, rsvps, users};

#[derive(Debug, Clone)]
pub struct Event {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
}

impl From<events::Model> for Event {
    fn from(model: events::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            date: model.date,
            location: model.location,
        }
    }
}

/// An event joined with its organizer's name and current attendance.
#[derive(Debug, Clone)]
pub struct EventWithOrganizer {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub organizer_name: String,
    pub rsvp_count: u64,
}

pub struct EventRepository {
    conn: DatabaseConnection,
}

impl EventRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
        date: &str,
        location: &str,
    ) -> Result<i32> {
        let active = events::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            date: Set(date.to_string()),
            location: Set(location.to_string()),
            ..Default::default()
        };

        let res = Events::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert event")?;

        Ok(res.last_insert_id)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Event>> {
        let event = Events::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query event by ID")?;

        Ok(event.map(Event::from))
    }

    /// Events sort by their free-text date column, newest first. `limit` of
    /// `None` returns all.
    pub async fn recent(&self, limit: Option<u64>) -> Result<Vec<Event>> {
        let mut query = Events::find().order_by_desc(events::Column::Date);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list events")?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Full listing with organizer names and RSVP counts, date desc.
    pub async fn recent_with_organizers(&self) -> Result<Vec<EventWithOrganizer>> {
        let rows = Events::find()
            .find_also_related(Users)
            .order_by_desc(events::Column::Date)
            .all(&self.conn)
            .await
            .context("Failed to list events")?;

        let mut out = Vec::with_capacity(rows.len());
        for (event, organizer) in rows {
            let rsvp_count = self.rsvp_count(event.id).await?;
            out.push(EventWithOrganizer {
                id: event.id,
                user_id: event.user_id,
                title: event.title,
                description: event.description,
                date: event.date,
                location: event.location,
                organizer_name: organizer.map(|u| u.name).unwrap_or_default(),
                rsvp_count,
            });
        }

        Ok(out)
    }

    // ========================================================================
    // RSVP Operations
    // ========================================================================

    /// Existence check backing the one-RSVP-per-(event, user) invariant.
    /// Check-then-insert is not atomic against concurrent requests for the
    /// same pair; the store carries no uniqueness constraint.
    pub async fn has_rsvp(&self, event_id: i32, user_id: i32) -> Result<bool> {
        let existing = Rsvps::find()
            .filter(rsvps::Column::EventId.eq(event_id))
            .filter(rsvps::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query RSVP")?;

        Ok(existing.is_some())
    }

    pub async fn add_rsvp(&self, event_id: i32, user_id: i32) -> Result<()> {
        let active = rsvps::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            ..Default::default()
        };

        Rsvps::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert RSVP")?;

        Ok(())
    }

    pub async fn rsvp_count(&self, event_id: i32) -> Result<u64> {
        let count = Rsvps::find()
            .filter(rsvps::Column::EventId.eq(event_id))
            .count(&self.conn)
            .await
            .context("Failed to count RSVPs")?;

        Ok(count)
    }
}
