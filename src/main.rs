use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamsite::{
    api,
    cache::{MemoryCache, RedisCache, SiteCache},
    config::{CacheBackend, Config},
    images::store::ImageDir,
    notify::{AlertsClient, Announcer, ChatClient, Notifier},
    storage::Database,
    tasks::{ImagePurge, SubscriptionExpiry},
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "streamsite starting");

    // Load configuration
    let config = Config::load()?;

    // Initialize database
    let db = Database::open(&config.server.data_dir)?;
    info!("Database opened at: {}", config.server.data_dir);

    // Initialize the image directory
    let images = ImageDir::new(&config.images.storage_path)?;
    info!("Image directory: {}", config.images.storage_path);

    // The cache backend and the chat broadcast transport share one Redis
    // connection; the memory backend has no chat leg.
    let (cache, chat): (Arc<dyn SiteCache>, Option<ChatClient>) = match config.cache.backend {
        CacheBackend::Redis => {
            let url = config
                .cache
                .redis_url
                .as_deref()
                .expect("REDIS_URL validated in config");
            let redis = RedisCache::connect(url).await?;
            let chat = ChatClient::new(redis.connection());
            info!("Using redis cache backend");
            (Arc::new(redis), Some(chat))
        }
        CacheBackend::Memory => {
            info!("Using in-memory cache backend; chat broadcasts disabled");
            (Arc::new(MemoryCache::new()), None)
        }
    };

    let alerts = config.alerts.as_ref().map(AlertsClient::new);
    if alerts.is_none() {
        info!("No alert service configured");
    }
    let announcer: Arc<dyn Announcer> = Arc::new(Notifier::new(chat, alerts));

    // Start the background sweeps
    let expiry = SubscriptionExpiry::new(db.clone(), Arc::clone(&cache), announcer);
    let purge = ImagePurge::new(db.clone(), images.clone());
    let sweep_handles = vec![
        tokio::spawn(expiry.run(Duration::from_secs(config.sweep.subscription_interval_secs))),
        tokio::spawn(purge.run(Duration::from_secs(config.sweep.image_interval_secs))),
    ];

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        images,
        cache,
    });

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!("Listening on: {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup: abort background tasks
    info!("Shutting down background tasks");
    for handle in sweep_handles {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
