pub mod contacts;
pub mod events;
pub mod index;
pub mod invitations;
pub mod reminders;
