//! Handlers HTTP. Cada rota converte a requisição em um [`Command`] e delega
//! para [`execute_command`], o único ponto que toca o store.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Query, State};
use tokio::time::Duration;
use tracing::debug;

use tidekv_common::{CommandError, RECENT_LOGS, StorageError, TideResult};
use tidekv_protocol::Command;
use tidekv_protocol::wire::{
    EnqueueBody, ExpireBody, GenerateKeyBody, HGetQuery, HSetBody, KeyBody, KeyQuery, QueueQuery,
    Reply, SetBody,
};
use tidekv_storage::TtlStatus;

use crate::{ApiError, AppState, Principal};

type ApiResult = Result<Json<Reply>, ApiError>;

/// Executa um comando já validado em nome de `principal`.
pub fn execute_command(cmd: Command, state: &AppState, principal: &Principal) -> TideResult<Reply> {
    if cmd.is_admin_only() {
        principal.require_admin()?;
    }

    debug!(
        user_id = %principal.user_id,
        write = cmd.is_write(),
        "comando recebido: {cmd:?}"
    );

    let reply = match cmd {
        Command::Get(key) => {
            let value = state.db.get(&key)?;
            Reply::Value { key, value }
        }
        Command::Set { key, value, ttl } => {
            let ttl = match ttl {
                Some(secs) if secs <= 0 => return Err(CommandError::InvalidTtl(secs).into()),
                Some(secs) => Some(Duration::from_secs(secs.unsigned_abs())),
                None => None,
            };
            let message = format!("Stored '{key}' successfully!");
            state.db.set(key, value, ttl);
            Reply::message(message)
        }
        Command::Delete(key) => {
            state.db.del(&key);
            Reply::message(format!("Deleted '{key}' successfully!"))
        }
        Command::Expire { key, ttl } => {
            state.db.expire(&key, ttl)?;
            Reply::message(format!("TTL set for '{key}' to {ttl} seconds"))
        }
        Command::Ttl(key) => {
            let ttl = match state.db.ttl(&key)? {
                TtlStatus::Remaining(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
                TtlStatus::NoExpiry => -1,
            };
            Reply::Ttl { key, ttl }
        }
        Command::ListKeys => Reply::Keys {
            keys: state.db.keys(),
        },
        Command::Incr(key) => {
            let value = state.db.incr(&key)?;
            Reply::Counter { key, value }
        }
        Command::Decr(key) => {
            let value = state.db.decr(&key)?;
            Reply::Counter { key, value }
        }
        Command::HSet { hash, field, value } => {
            let message = format!("Stored field '{field}' in hash '{hash}'");
            state.db.hset(&hash, field, value)?;
            Reply::message(message)
        }
        Command::HGet { hash, field } => {
            let value = state.db.hget(&hash, &field)?;
            Reply::Field { hash, field, value }
        }
        Command::Enqueue { queue, value } => {
            let message = format!("Enqueued '{value}' to queue '{queue}'");
            state.queues.enqueue(&queue, value);
            Reply::message(message)
        }
        Command::Dequeue(queue) => {
            let value = state
                .queues
                .dequeue(&queue)
                .ok_or(StorageError::QueueEmpty)?;
            Reply::Dequeued { queue, value }
        }
        Command::ListQueues => Reply::Queues {
            queues: state.queues.names(),
        },
        Command::GenerateKey { user_id, role } => {
            let api_key = state.auth.generate_key(user_id, role);
            Reply::ApiKey { api_key, role }
        }
        Command::Logs => Reply::Logs {
            logs: state.request_log.recent(RECENT_LOGS),
        },
        Command::Health => health_reply(state),
    };

    Ok(reply)
}

fn health_reply(state: &AppState) -> Reply {
    Reply::Health {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        keys: state.db.live_count(),
        queues: state.queues.count(),
    }
}

fn run(state: &AppState, principal: &Principal, cmd: Result<Command, CommandError>) -> ApiResult {
    let reply = execute_command(cmd?, state, principal)?;
    Ok(Json(reply))
}

pub async fn set(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<SetBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::set(body))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    run(&state, &principal, Command::get(query))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::delete(body))
}

pub async fn expire(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<ExpireBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::expire(body))
}

pub async fn ttl(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    run(&state, &principal, Command::ttl(query))
}

pub async fn list_keys(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult {
    run(&state, &principal, Ok(Command::ListKeys))
}

pub async fn incr(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::incr(body))
}

pub async fn decr(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::decr(body))
}

pub async fn hset(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<HSetBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::hset(body))
}

pub async fn hget(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<HGetQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    run(&state, &principal, Command::hget(query))
}

pub async fn enqueue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<EnqueueBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    run(&state, &principal, Command::enqueue(body))
}

pub async fn dequeue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<QueueQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    run(&state, &principal, Command::dequeue(query))
}

pub async fn list_queues(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult {
    run(&state, &principal, Ok(Command::ListQueues))
}

pub async fn generate_key(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<GenerateKeyBody>, JsonRejection>,
) -> ApiResult {
    // Papel antes do corpo: usuário comum recebe 403 mesmo com JSON inválido
    principal.require_admin()?;
    let Json(body) = body?;
    run(&state, &principal, Command::generate_key(body))
}

pub async fn logs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult {
    run(&state, &principal, Ok(Command::Logs))
}

/// Rota pública, fora do gate de chaves.
pub async fn health(State(state): State<AppState>) -> Json<Reply> {
    Json(health_reply(&state))
}
