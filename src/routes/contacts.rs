use crate::app_state::AppState;
use crate::handlers::contacts;
use axum::routing::get;
use axum::Router;

pub fn contacts_routes() -> Router<AppState> {
    Router::new().route(
        "/contacts/{id}/invitations",
        get(contacts::get_contact_invitations),
    )
}
