use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::Duration;
use tracing::info;

use tidekv_common::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REAP_BATCH, DEFAULT_REAP_INTERVAL_MS, MAX_BODY_BYTES,
    REQUEST_LOG_CAPACITY,
};
use tidekv_server::{AppState, ServerConfig, router};

#[derive(Parser, Debug)]
#[command(name = "tidekv-server", about = "TideKV: key-value store e filas via HTTP")]
struct Args {
    #[arg(long, env = "TIDEKV_HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "TIDEKV_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Chaves com papel admin (repetível ou separadas por vírgula)
    #[arg(long = "admin-key", env = "TIDEKV_ADMIN_KEYS", value_delimiter = ',', hide_env_values = true)]
    admin_keys: Vec<String>,
    /// Chaves com papel user
    #[arg(long = "user-key", env = "TIDEKV_USER_KEYS", value_delimiter = ',', hide_env_values = true)]
    user_keys: Vec<String>,
    #[arg(long, env = "TIDEKV_REAP_INTERVAL_MS", default_value_t = DEFAULT_REAP_INTERVAL_MS)]
    reap_interval_ms: u64,
    #[arg(long, env = "TIDEKV_REAP_BATCH", default_value_t = DEFAULT_REAP_BATCH)]
    reap_batch: usize,
    #[arg(long, env = "TIDEKV_MAX_BODY_BYTES", default_value_t = MAX_BODY_BYTES)]
    max_body_bytes: usize,
    #[arg(long, env = "TIDEKV_REQUEST_LOG_CAPACITY", default_value_t = REQUEST_LOG_CAPACITY)]
    request_log_capacity: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            admin_keys: args.admin_keys,
            user_keys: args.user_keys,
            reap_interval: Duration::from_millis(args.reap_interval_ms),
            reap_batch: args.reap_batch,
            max_body_bytes: args.max_body_bytes,
            request_log_capacity: args.request_log_capacity,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidekv_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from(Args::parse());
    config.validate()?;

    let state = AppState::new(&config);
    info!(
        keys = state.auth.key_count(),
        reap_interval_ms = config.reap_interval.as_millis() as u64,
        "store inicializado"
    );

    let app = router(state, config.max_body_bytes);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("TideKV escutando em {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("falha ao escutar ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal recebido");
}
