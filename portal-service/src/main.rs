use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use portal_service::{
    build_router,
    config::AppConfig,
    error::AppError,
    services::{AuthService, Database, HttpSmsSender, JwtService, RedisKv, ResponseCache, SmsVerifier},
    workers::WorkerPool,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Fail fast on invalid configuration
    let config = AppConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "Starting service"
    );

    let database = Database::connect(&config.database).await?;
    database.migrate().await?;

    let kv = Arc::new(RedisKv::new(&config.redis).await?);
    let kv: Arc<dyn portal_service::services::KeyValueStore> = kv;

    let jwt = JwtService::new(&config.jwt)?;

    let sms: Arc<dyn portal_service::services::SmsSender> =
        Arc::new(HttpSmsSender::new(&config.sms));

    // Dev pins the verification code so flows work without a gateway
    let fixed_code = config.is_dev().then(|| "12345".to_string());
    let verifier = SmsVerifier::new(kv.clone(), fixed_code);

    let (worker_pool, jobs) = WorkerPool::new(
        config.worker.clone(),
        database.clone(),
        sms,
        config.media.clone(),
    );
    let shutdown_token = worker_pool.start();

    let cache = ResponseCache::new(kv.clone(), config.cache.expiry_seconds);
    let auth = AuthService::new(database.clone(), jwt.clone(), verifier, jobs.clone());

    let state = AppState {
        config: config.clone(),
        db: database,
        jwt,
        kv,
        cache,
        auth,
        jobs,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_token.cancel();
    tracing::info!("Service shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!("Failed to install signal handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
