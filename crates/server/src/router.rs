use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use tidekv_storage::{Db, QueueStore};

use crate::handler;
use crate::{AuthGate, RequestLog, ServerConfig, auth};

/// Estado compartilhado por todos os handlers. Clonar é barato.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub queues: QueueStore,
    pub auth: Arc<AuthGate>,
    pub request_log: Arc<RequestLog>,
}

impl AppState {
    /// Precisa de um runtime tokio ativo (o store dispara o reaper).
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            db: Db::with_config(config.store_config()),
            queues: QueueStore::new(),
            auth: Arc::new(AuthGate::new(
                config.admin_keys.clone(),
                config.user_keys.clone(),
            )),
            request_log: Arc::new(RequestLog::new(config.request_log_capacity)),
        }
    }
}

/// Monta o router completo.
///
/// Todas as rotas, exceto `/health`, passam pelo middleware de chave de API.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let protected = Router::new()
        .route("/set", post(handler::set))
        .route("/get", get(handler::get))
        .route("/delete", delete(handler::delete))
        .route("/expire", post(handler::expire))
        .route("/ttl", get(handler::ttl))
        .route("/list_keys", get(handler::list_keys))
        .route("/incr", post(handler::incr))
        .route("/decr", post(handler::decr))
        .route("/hset", post(handler::hset))
        .route("/hget", get(handler::hget))
        .route("/enqueue", post(handler::enqueue))
        .route("/dequeue", get(handler::dequeue))
        .route("/list_queues", get(handler::list_queues))
        .route("/generate_key", post(handler::generate_key))
        .route("/logs", get(handler::logs))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(handler::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
