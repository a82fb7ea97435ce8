use crate::app_state::AppState;
use crate::handlers::reminders;
use axum::routing::{get, put};
use axum::Router;

pub fn reminders_routes() -> Router<AppState> {
    Router::new()
        .route("/reminders", get(reminders::list_reminders))
        // DELETE cancels the reminder; reminder rows are never hard-deleted
        .route(
            "/reminders/{id}",
            put(reminders::update_reminder).delete(reminders::cancel_reminder),
        )
}
