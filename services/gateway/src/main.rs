use gateway::{AppState, MenuIcon, ServiceUrls};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let defaults = ServiceUrls::default();
    let services = ServiceUrls {
        users: env::var("USERS_SERVICE_URL").unwrap_or(defaults.users),
        chats: env::var("CHATS_SERVICE_URL").unwrap_or(defaults.chats),
        beatmaps: env::var("BEATMAPS_SERVICE_URL").unwrap_or(defaults.beatmaps),
        scores: env::var("SCORES_SERVICE_URL").unwrap_or(defaults.scores),
    };

    let mut state = AppState::new(services);
    if let Ok(welcome_message) = env::var("WELCOME_MESSAGE") {
        state.welcome_message = welcome_message;
    }
    if let (Ok(icon_url), Ok(onclick_url)) =
        (env::var("MENU_ICON_URL"), env::var("MENU_ONCLICK_URL"))
    {
        state.menu_icon = Some(MenuIcon {
            icon_url,
            onclick_url,
        });
    }

    let router = gateway::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");
    info!(addr = %bind_addr, "gateway listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
    info!("gateway shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful shutdown.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
