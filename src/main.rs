use forwarder::{
    Method,
    app::AppState,
    config::AppConfig,
    handlers,
    middleware::{IntoMiddleware, body_limit::BodyLimit},
    router::Router,
    state::set_state,
    types::Request,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forwarder::tracing_setup::init_tracing();

    let config = AppConfig::from_env()?;
    if config.strict_webhook_auth {
        tracing::info!("STRICT_WEBHOOK_AUTH is set but not yet wired to any behavior");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations_on_startup {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let max_body_bytes = config.max_body_bytes;
    let state = AppState::new(config, pool);
    set_state(state);

    let mut router = Router::new();
    router
        .route(Method::POST, "/webhook/alchemy", handlers::ingest_alchemy)
        .middleware(BodyLimit::<fn(&Request) -> usize>::new(max_body_bytes).into_middleware());
    router.route(Method::GET, "/webhook/alchemy/events", handlers::list_events);
    router.route(Method::GET, "/ping", handlers::ping);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    forwarder::serve(listener, router).await;

    Ok(())
}
