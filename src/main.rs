use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use backend::{
    AppState,
    config::Config,
    router::create_router,
    session::MySqlSessionStore,
    sweep::{SessionSweep, SystemClock},
};
use sqlx::mysql::MySqlPoolOptions;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Panics are logged; the runtime keeps serving other requests.
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Uncaught panic: {}", info);
    }));

    let config = Config::from_env().expect("Failed to load configuration");
    if config.is_production() {
        tracing::info!("Running in production mode, session cookies are secure and cross-site");
    } else {
        tracing::info!("Running in development mode, session cookies are same-site lax");
    }

    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(config.database_options())
        .await
        .expect("Failed to connect to MySQL");

    let session_store = MySqlSessionStore::new(pool.clone())
        .with_expiration(config.session_max_age_secs as i64);
    session_store
        .migrate()
        .await
        .expect("Failed to prepare the sessions table");

    if tokio::fs::metadata(&config.uploads_dir).await.is_err() {
        tokio::fs::create_dir_all(&config.uploads_dir)
            .await
            .expect("Failed to create uploads directory");
        tracing::info!("Created uploads directory {}", config.uploads_dir);
    }

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        sessions: Arc::new(session_store),
    };

    let sweep = Arc::new(SessionSweep::new(
        state.sessions.clone(),
        Arc::new(pool),
        Arc::new(SystemClock),
    ));
    let sweep_task = sweep.spawn(config.sweep_interval());

    let app = create_router(state);

    let addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Server is running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    sweep_task.abort();
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
