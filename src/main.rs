use qa_platform::{
    AppState, LocalImageStore, LogMailer, MailerState, PostgresRepository, RepositoryState,
    StorageState, bootstrap,
    config::{AppConfig, Env},
    create_router,
    storage::ImageStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point: configuration, logging, database (with migrations), image
/// store, superAdmin bootstrap, then the HTTP server.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    // Fail-fast: missing mandatory secrets abort startup here.
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qa_platform=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON output for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Schema must be in place before the bootstrap account is created.
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("FATAL: Database migration failed.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let image_store = LocalImageStore::new(&config.image_dir);
    image_store
        .ensure_ready()
        .await
        .expect("FATAL: Failed to prepare the image store directory.");
    let storage = Arc::new(image_store) as StorageState;

    let mailer = Arc::new(LogMailer) as MailerState;

    bootstrap::ensure_super_admin(repo.as_ref(), &config.super_admin_password)
        .await
        .expect("FATAL: superAdmin bootstrap failed.");

    let app_state = AppState {
        repo,
        storage,
        mailer,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
