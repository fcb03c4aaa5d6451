pub mod event;
pub mod mentorship;
pub mod post;
pub mod user;
