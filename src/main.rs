//! Business directory server: load settings, bootstrap the database, serve the API.

use business_directory::{
    app, apply_migrations, connect, ensure_database_exists, entities, validate_model, AppState, Settings,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("business_directory=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    validate_model(&entities::all())?;

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect(&settings).await?;
    if settings.run_migrations {
        apply_migrations(&pool).await?;
    }

    let bind_address = settings.bind_address;
    let router = app(AppState::new(pool, settings));

    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
