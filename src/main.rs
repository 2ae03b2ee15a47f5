use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use intake_wizard::config::{SupabaseConfig, WizardConfig};
use intake_wizard::gateway::{LocalGateway, SubmissionGateway, SupabaseGateway};
use intake_wizard::store::{Database, LibSqlBackend};
use intake_wizard::wizard::{StepStore, WizardManager, WizardRouteState, wizard_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WizardConfig::from_env().context("Invalid configuration")?;

    eprintln!("Intake Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/wizard/sessions", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Gateway ──────────────────────────────────────────────────────────
    let mut app: axum::Router = axum::Router::new();
    let gateway: Arc<dyn SubmissionGateway> = match SupabaseConfig::from_env() {
        Some(supabase) => {
            eprintln!("   Gateway: supabase ({})", supabase.url);
            Arc::new(SupabaseGateway::new(supabase, &config.storage))
        }
        None => {
            let local = LocalGateway::new(Arc::clone(&db), &config.storage);
            tokio::fs::create_dir_all(local.upload_dir())
                .await
                .with_context(|| {
                    format!("Failed to create upload dir {}", local.upload_dir().display())
                })?;
            eprintln!(
                "   Gateway: local (files in {}, served from {}/files)",
                local.upload_dir().display(),
                config.storage.public_base_url
            );
            app = app.nest_service("/files", ServeDir::new(local.upload_dir()));
            Arc::new(local)
        }
    };

    // ── Wizard ───────────────────────────────────────────────────────────
    let manager = Arc::new(WizardManager::new(
        StepStore::new(Arc::clone(&db)),
        gateway,
        config.storage.upload_prefix.clone(),
        config.home_url.clone(),
    ));

    // Drop idle in-memory sessions
    let pruner = Arc::clone(&manager);
    let session_idle_timeout = config.session_idle_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600)); // Every 10 min
        interval.tick().await; // Skip immediate first tick
        loop {
            interval.tick().await;
            pruner.prune_stale_sessions(session_idle_timeout).await;
        }
    });

    let app = app
        .merge(wizard_routes(WizardRouteState { manager }))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Wizard server started");
    axum::serve(listener, app).await?;

    Ok(())
}
