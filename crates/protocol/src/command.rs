use serde_json::{Value, json};
use tidekv_common::CommandError;

use crate::Parse;
use crate::wire::{
    EnqueueBody, ExpireBody, GenerateKeyBody, HGetQuery, HSetBody, KeyBody, KeyQuery, QueueQuery,
    Role, SetBody,
};

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Get(String),
    Set {
        key: String,
        value: String,
        ttl: Option<i64>,
    },
    Delete(String),
    Expire {
        key: String,
        ttl: i64,
    },
    Ttl(String),
    ListKeys,
    Incr(String),
    Decr(String),
    HSet {
        hash: String,
        field: String,
        value: String,
    },
    HGet {
        hash: String,
        field: String,
    },
    Enqueue {
        queue: String,
        value: String,
    },
    Dequeue(String),
    ListQueues,
    GenerateKey {
        user_id: String,
        role: Role,
    },
    Logs,
    Health,
}

/// Método HTTP de uma rota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Requisição HTTP que executa um comando no servidor.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl Route {
    fn get(path: &'static str, query: Vec<(&'static str, String)>) -> Self {
        Route {
            method: Method::Get,
            path,
            query,
            body: None,
        }
    }

    fn with_body(method: Method, path: &'static str, body: Value) -> Self {
        Route {
            method,
            path,
            query: Vec::new(),
            body: Some(body),
        }
    }
}

impl Command {
    /// Faz o parse dos tokens de uma linha de comando em um Command.
    pub fn from_args(args: Vec<String>) -> Result<Command, CommandError> {
        let mut parse = Parse::new(args)?;
        let name = parse.next_string()?.to_lowercase();

        let cmd = parse_args(&name, &mut parse)?;
        parse.finish()?;
        Ok(cmd)
    }

    /// Comandos reservados a chaves com papel `admin`.
    pub fn is_admin_only(&self) -> bool {
        matches!(self, Command::GenerateKey { .. } | Command::Logs)
    }

    /// Comandos que alteram o estado do store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Set { .. }
                | Command::Delete(_)
                | Command::Expire { .. }
                | Command::Incr(_)
                | Command::Decr(_)
                | Command::HSet { .. }
                | Command::Enqueue { .. }
                | Command::Dequeue(_)
                | Command::GenerateKey { .. }
        )
    }

    // --- Construção a partir do contrato HTTP ---

    pub fn set(body: SetBody) -> Result<Command, CommandError> {
        let key = required(body.key, "key")?;
        let value = body.value.ok_or(CommandError::MissingField("value"))?;
        if let Some(ttl) = body.ttl
            && ttl <= 0
        {
            return Err(CommandError::InvalidTtl(ttl));
        }
        Ok(Command::Set {
            key,
            value,
            ttl: body.ttl,
        })
    }

    pub fn get(query: KeyQuery) -> Result<Command, CommandError> {
        Ok(Command::Get(required(query.key, "key")?))
    }

    pub fn delete(body: KeyBody) -> Result<Command, CommandError> {
        Ok(Command::Delete(required(body.key, "key")?))
    }

    pub fn expire(body: ExpireBody) -> Result<Command, CommandError> {
        let key = required(body.key, "key")?;
        let ttl = body.ttl.ok_or(CommandError::MissingField("ttl"))?;
        Ok(Command::Expire { key, ttl })
    }

    pub fn ttl(query: KeyQuery) -> Result<Command, CommandError> {
        Ok(Command::Ttl(required(query.key, "key")?))
    }

    pub fn incr(body: KeyBody) -> Result<Command, CommandError> {
        Ok(Command::Incr(required(body.key, "key")?))
    }

    pub fn decr(body: KeyBody) -> Result<Command, CommandError> {
        Ok(Command::Decr(required(body.key, "key")?))
    }

    pub fn hset(body: HSetBody) -> Result<Command, CommandError> {
        Ok(Command::HSet {
            hash: required(body.hash, "hash")?,
            field: required(body.field, "field")?,
            value: body.value.ok_or(CommandError::MissingField("value"))?,
        })
    }

    pub fn hget(query: HGetQuery) -> Result<Command, CommandError> {
        Ok(Command::HGet {
            hash: required(query.hash, "hash")?,
            field: required(query.field, "field")?,
        })
    }

    pub fn enqueue(body: EnqueueBody) -> Result<Command, CommandError> {
        Ok(Command::Enqueue {
            queue: required(body.queue, "queue")?,
            value: body.value.ok_or(CommandError::MissingField("value"))?,
        })
    }

    pub fn dequeue(query: QueueQuery) -> Result<Command, CommandError> {
        Ok(Command::Dequeue(required(query.queue, "queue")?))
    }

    pub fn generate_key(body: GenerateKeyBody) -> Result<Command, CommandError> {
        let user_id = required(body.user_id, "user_id")?;
        let role = match body.role {
            Some(r) => Role::parse(&r).ok_or(CommandError::InvalidRole(r))?,
            None => Role::User,
        };
        Ok(Command::GenerateKey { user_id, role })
    }

    /// Rota HTTP equivalente ao comando, usada pelo cliente.
    pub fn to_route(&self) -> Route {
        match self {
            Command::Get(key) => Route::get("/get", vec![("key", key.clone())]),
            Command::Set { key, value, ttl } => {
                let mut body = json!({ "key": key, "value": value });
                if let Some(ttl) = ttl {
                    body["ttl"] = json!(ttl);
                }
                Route::with_body(Method::Post, "/set", body)
            }
            Command::Delete(key) => Route::with_body(Method::Delete, "/delete", json!({ "key": key })),
            Command::Expire { key, ttl } => {
                Route::with_body(Method::Post, "/expire", json!({ "key": key, "ttl": ttl }))
            }
            Command::Ttl(key) => Route::get("/ttl", vec![("key", key.clone())]),
            Command::ListKeys => Route::get("/list_keys", vec![]),
            Command::Incr(key) => Route::with_body(Method::Post, "/incr", json!({ "key": key })),
            Command::Decr(key) => Route::with_body(Method::Post, "/decr", json!({ "key": key })),
            Command::HSet { hash, field, value } => Route::with_body(
                Method::Post,
                "/hset",
                json!({ "hash": hash, "field": field, "value": value }),
            ),
            Command::HGet { hash, field } => Route::get(
                "/hget",
                vec![("hash", hash.clone()), ("field", field.clone())],
            ),
            Command::Enqueue { queue, value } => Route::with_body(
                Method::Post,
                "/enqueue",
                json!({ "queue": queue, "value": value }),
            ),
            Command::Dequeue(queue) => Route::get("/dequeue", vec![("queue", queue.clone())]),
            Command::ListQueues => Route::get("/list_queues", vec![]),
            Command::GenerateKey { user_id, role } => Route::with_body(
                Method::Post,
                "/generate_key",
                json!({ "user_id": user_id, "role": role.as_str() }),
            ),
            Command::Logs => Route::get("/logs", vec![]),
            Command::Health => Route::get("/health", vec![]),
        }
    }
}

/// Campo obrigatório e não vazio.
fn required(value: Option<String>, field: &'static str) -> Result<String, CommandError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CommandError::MissingField(field)),
    }
}

fn parse_args(name: &str, parse: &mut Parse) -> Result<Command, CommandError> {
    let cmd = match name {
        "get" => Command::Get(parse.next_string()?),
        "set" => {
            let key = parse.next_string()?;
            let value = parse.next_string()?;
            let ttl = if parse.has_remaining() {
                let ttl = parse.next_int()?;
                if ttl <= 0 {
                    return Err(CommandError::InvalidTtl(ttl));
                }
                Some(ttl)
            } else {
                None
            };
            Command::Set { key, value, ttl }
        }
        "del" | "delete" => Command::Delete(parse.next_string()?),
        "expire" => {
            let key = parse.next_string()?;
            let ttl = parse.next_int()?;
            Command::Expire { key, ttl }
        }
        "ttl" => Command::Ttl(parse.next_string()?),
        "keys" | "list_keys" => Command::ListKeys,
        "incr" => Command::Incr(parse.next_string()?),
        "decr" => Command::Decr(parse.next_string()?),
        "hset" => Command::HSet {
            hash: parse.next_string()?,
            field: parse.next_string()?,
            value: parse.next_string()?,
        },
        "hget" => Command::HGet {
            hash: parse.next_string()?,
            field: parse.next_string()?,
        },
        "enqueue" => Command::Enqueue {
            queue: parse.next_string()?,
            value: parse.next_string()?,
        },
        "dequeue" => Command::Dequeue(parse.next_string()?),
        "queues" | "list_queues" => Command::ListQueues,
        "genkey" | "generate_key" => {
            let user_id = parse.next_string()?;
            let role = match parse.next_optional() {
                Some(r) => Role::parse(&r).ok_or(CommandError::InvalidRole(r))?,
                None => Role::User,
            };
            Command::GenerateKey { user_id, role }
        }
        "logs" => Command::Logs,
        "health" => Command::Health,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(cmd)
}
