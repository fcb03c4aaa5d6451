pub use super::events::Entity as Events;
pub use super::mentorships::Entity as Mentorships;
pub use super::posts::Entity as Posts;
pub use super::rsvps::Entity as Rsvps;
pub use super::users::Entity as Users;
