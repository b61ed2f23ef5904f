//! Shared application state: the composable pipeline assembled once at
//! startup and handed to every request via the framework's state store,
//! rather than a service-locator lookup scattered through the handlers.

use std::sync::Arc;

use crate::{
    auth::Authenticator,
    config::AppConfig,
    dedup::Deduplicator,
    repository::EventRepository,
    retry::{RetryConfig, RetryPolicy},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: Arc<Authenticator>,
    pub deduplicator: Arc<Deduplicator>,
    pub repository: Arc<EventRepository>,
    pub retry: Arc<RetryPolicy>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: sqlx::PgPool) -> Self {
        let authenticator = Authenticator::new(&config);

        Self {
            config: Arc::new(config),
            authenticator: Arc::new(authenticator),
            deduplicator: Arc::new(Deduplicator::new()),
            repository: Arc::new(EventRepository::new(pool)),
            retry: Arc::new(RetryPolicy::new(RetryConfig::default())),
        }
    }
}
