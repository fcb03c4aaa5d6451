pub mod prelude;

pub mod events;
pub mod mentorships;
pub mod posts;
pub mod rsvps;
pub mod users;
