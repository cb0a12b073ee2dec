use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studygate_api::config::ServerConfig;
use studygate_api::{background, router, state};
use studygate_events::{AuditRecorder, AuditSink, EmailConfig, EmailSender, NoopSender, SmtpSender};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studygate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Arc::new(ServerConfig::from_env());
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = studygate_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    studygate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    studygate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // --- Mailer ---
    let mailer: Arc<dyn EmailSender> = match EmailConfig::from_env() {
        Some(email_config) => {
            let sender =
                SmtpSender::new(&email_config).expect("Failed to build SMTP transport");
            tracing::info!(host = %email_config.smtp_host, "SMTP mailer configured");
            Arc::new(sender)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, outgoing email is disabled");
            Arc::new(NoopSender)
        }
    };

    // --- Audit trail ---
    let recorder = Arc::new(AuditRecorder::default());

    // Spawn the sink that persists every recorded event.
    let sink_handle = tokio::spawn(AuditSink::run(pool.clone(), recorder.subscribe()));

    // --- Email outbox ---
    let outbox_cancel = tokio_util::sync::CancellationToken::new();
    let outbox_handle = tokio::spawn(background::email_outbox::run(
        pool.clone(),
        Arc::clone(&config),
        Arc::clone(&mailer),
        outbox_cancel.clone(),
    ));

    tracing::info!("Background services started (audit sink, email outbox)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        mailer,
        recorder: Arc::clone(&recorder),
    };

    // --- Router ---
    let app = router::build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the email outbox.
    outbox_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), outbox_handle).await;
    tracing::info!("Email outbox stopped");

    // Drop the recorder to close the broadcast channel. Handler clones went
    // away with the router, so the sink drains its backlog and exits.
    drop(recorder);
    let _ = tokio::time::timeout(Duration::from_secs(5), sink_handle).await;
    tracing::info!("Audit sink shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
