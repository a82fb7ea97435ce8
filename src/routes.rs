mod contacts;
mod events;
mod index;
mod reminders;

use crate::app_state::AppState;
use crate::middlewares::auth::auth_middleware;
use axum::{http::header, middleware, Router};
use tower_http::cors::{Any, CorsLayer};

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Everything except the health check requires a bearer token
    let api = Router::new()
        .merge(events::events_routes())
        .merge(reminders::reminders_routes())
        .merge(contacts::contacts_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(index::index_route())
        .merge(api)
        .layer(cors)
        .with_state(state)
}
