use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{posts, prelude::*, users};

/// A post joined with its author's display name.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub author_name: String,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            body: model.body,
            created_at: model.created_at,
        }
    }
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        body: &str,
        created_at: &str,
    ) -> Result<i32> {
        let active = posts::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            created_at: Set(created_at.to_string()),
            ..Default::default()
        };

        let res = Posts::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to insert post")?;

        Ok(res.last_insert_id)
    }

    /// Most-recent-first feed with author names. `limit` of `None` returns
    /// the full listing.
    pub async fn recent_with_authors(&self, limit: Option<u64>) -> Result<Vec<PostWithAuthor>> {
        let mut query = Posts::find()
            .find_also_related(Users)
            .order_by_desc(posts::Column::CreatedAt);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list posts")?;

        Ok(rows
            .into_iter()
            .map(|(post, author)| PostWithAuthor {
                id: post.id,
                user_id: post.user_id,
                title: post.title,
                body: post.body,
                created_at: post.created_at,
                author_name: author.map(|u| u.name).unwrap_or_default(),
            })
            .collect())
    }

    /// All posts by one member, most recent first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Post>> {
        let rows = Posts::find()
            .filter(posts::Column::UserId.eq(user_id))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list posts for user")?;

        Ok(rows.into_iter().map(Post::from).collect())
    }
}
