use crate::app_state::AppState;
use crate::handlers::{events, invitations, reminders};
use axum::routing::{get, post};
use axum::Router;

pub fn events_routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create_event))
        // Path kept as-is, the frontend calls it by this name
        .route("/getAllMyEvents", get(events::get_all_my_events))
        .route("/events/{id}/rsvps", get(events::get_event_rsvps))
        .route("/events/{id}/invitations", post(invitations::send_invitations))
        .route("/events/{id}/rsvp", post(invitations::update_rsvp))
        .route(
            "/events/{id}/reminders",
            post(reminders::create_reminder).get(reminders::get_event_reminders),
        )
}
