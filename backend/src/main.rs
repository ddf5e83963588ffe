use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostel_api::{
    build_router,
    config::Config,
    db::{self, users::PgUserStore},
    services::{auth::AuthService, email::EmailService},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else if config.production {
        tracing::warn!("SMTP not configured: password reset links cannot be delivered");
    } else {
        info!("SMTP not configured: reset links are returned in responses (non-production)");
    }

    let store: Arc<PgUserStore> = Arc::new(PgUserStore::new(pool));
    let auth = AuthService::from_config(&config, store.clone(), email);

    let state = AppState {
        store,
        auth: Arc::new(auth),
    };

    let app = build_router(state, &config.app_base_url);

    let addr = format!("{}:{}", config.host, config.port);
    info!("hostel API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
