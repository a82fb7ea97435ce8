pub mod contacts;
pub mod events;
pub mod invitations;
pub mod reminders;
pub mod sessions;
pub mod users;
