use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::event::{Event, EventWithOrganizer};
pub use repositories::mentorship::MentorshipEntry;
pub use repositories::post::{Post, PostWithAuthor};
pub use repositories::user::{Member, NewMember, hash_password};

/// Facade over the database connection pool. One `Store` is shared across the
/// app; every statement borrows a pooled connection for its own lifetime and
/// releases it on all exit paths.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        // One-time schema bootstrap; a no-op on every subsequent start.
        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & schema ready (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn event_repo(&self) -> repositories::event::EventRepository {
        repositories::event::EventRepository::new(self.conn.clone())
    }

    fn mentorship_repo(&self) -> repositories::mentorship::MentorshipRepository {
        repositories::mentorship::MentorshipRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub async fn create_user(&self, member: NewMember) -> Result<i32> {
        self.user_repo().create(member).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<Member>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn search_users(&self, query: &str, limit: u64) -> Result<Vec<Member>> {
        self.user_repo().search(query, limit).await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn create_post(
        &self,
        user_id: i32,
        title: &str,
        body: &str,
        created_at: &str,
    ) -> Result<i32> {
        self.post_repo().create(user_id, title, body, created_at).await
    }

    pub async fn recent_posts(&self, limit: Option<u64>) -> Result<Vec<PostWithAuthor>> {
        self.post_repo().recent_with_authors(limit).await
    }

    pub async fn posts_for_user(&self, user_id: i32) -> Result<Vec<Post>> {
        self.post_repo().list_for_user(user_id).await
    }

    // ========================================================================
    // Events & RSVPs
    // ========================================================================

    pub async fn create_event(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
        date: &str,
        location: &str,
    ) -> Result<i32> {
        self.event_repo()
            .create(user_id, title, description, date, location)
            .await
    }

    pub async fn get_event(&self, id: i32) -> Result<Option<Event>> {
        self.event_repo().get(id).await
    }

    pub async fn recent_events(&self, limit: Option<u64>) -> Result<Vec<Event>> {
        self.event_repo().recent(limit).await
    }

    pub async fn events_with_organizers(&self) -> Result<Vec<EventWithOrganizer>> {
        self.event_repo().recent_with_organizers().await
    }

    pub async fn has_rsvp(&self, event_id: i32, user_id: i32) -> Result<bool> {
        self.event_repo().has_rsvp(event_id, user_id).await
    }

    pub async fn add_rsvp(&self, event_id: i32, user_id: i32) -> Result<()> {
        self.event_repo().add_rsvp(event_id, user_id).await
    }

    pub async fn rsvp_count(&self, event_id: i32) -> Result<u64> {
        self.event_repo().rsvp_count(event_id).await
    }

    // ========================================================================
    // Mentorship
    // ========================================================================

    pub async fn create_mentorship(
        &self,
        user_id: i32,
        topic: &str,
        role: &str,
        created_at: &str,
    ) -> Result<i32> {
        self.mentorship_repo()
            .create(user_id, topic, role, created_at)
            .await
    }

    pub async fn mentorships_by_role(&self, role: &str) -> Result<Vec<MentorshipEntry>> {
        self.mentorship_repo().list_by_role(role).await
    }
}
