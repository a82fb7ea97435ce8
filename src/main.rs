mod app_state;
mod clock;
mod db;
mod dispatch;
mod error;
mod handlers;
mod middlewares;
mod models;
mod notifier;
mod queries;
mod resolver;
mod routes;
mod scheduler;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::clock::SystemClock;
use crate::notifier::{LogNotifier, Notifier, SmtpNotifier};
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pool = match db::connect_to_db().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::init_db(&pool).await {
        tracing::error!("Error initializing database: {}", e);
        std::process::exit(1);
    }

    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_env() {
        Ok(Some(smtp)) => Arc::new(smtp),
        Ok(None) => {
            tracing::warn!("SMTP_SERVER not set, deliveries will only be logged");
            Arc::new(LogNotifier)
        }
        Err(e) => {
            tracing::error!("Invalid SMTP configuration: {}", e);
            std::process::exit(1);
        }
    };

    let scheduler = Scheduler::from_env(pool.clone(), notifier, Arc::new(SystemClock));
    tokio::spawn(async move {
        scheduler.run().await;
    });

    let state = app_state::AppState { db_pool: pool };
    let app = routes::create_routes(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await.unwrap();
}
