//! Tipos JSON trocados com o servidor HTTP.
//!
//! Os corpos de requisição usam campos opcionais: a ausência de um campo
//! obrigatório é detectada na conversão para [`Command`](crate::Command), que
//! devolve uma mensagem descritiva em vez da rejeição genérica do extractor.

use serde::{Deserialize, Serialize};

/// Papel associado a uma chave de API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

// --- Corpos de requisição ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetBody {
    pub key: Option<String>,
    pub value: Option<String>,
    pub ttl: Option<i64>,
}

/// Corpo com apenas `key` (delete, incr, decr).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyBody {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpireBody {
    pub key: Option<String>,
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnqueueBody {
    pub queue: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HSetBody {
    pub hash: Option<String>,
    pub field: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateKeyBody {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

// --- Query strings ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueQuery {
    pub queue: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HGetQuery {
    pub hash: Option<String>,
    pub field: Option<String>,
}

// --- Respostas ---

/// Entrada do log de requisições autorizadas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub user_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub timestamp: i64,
}

/// Corpo de sucesso de qualquer operação.
///
/// Serializado sem tag: cada variante vira exatamente o objeto JSON que o
/// painel espera (`{message}`, `{key, value}`, `{keys}`...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Message {
        message: String,
    },
    Value {
        key: String,
        value: String,
    },
    Counter {
        key: String,
        value: i64,
    },
    Keys {
        keys: Vec<String>,
    },
    Queues {
        queues: Vec<String>,
    },
    /// `ttl == -1` indica chave sem expiração.
    Ttl {
        key: String,
        ttl: i64,
    },
    Dequeued {
        queue: String,
        value: String,
    },
    Field {
        hash: String,
        field: String,
        value: String,
    },
    ApiKey {
        api_key: String,
        role: Role,
    },
    Logs {
        logs: Vec<LogEntry>,
    },
    Health {
        status: String,
        version: String,
        keys: usize,
        queues: usize,
    },
}

impl Reply {
    pub fn message(message: impl Into<String>) -> Self {
        Reply::Message {
            message: message.into(),
        }
    }
}

/// Corpo de erro uniforme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_serializes_flat() {
        let reply = Reply::Value {
            key: "a".into(),
            value: "1".into(),
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"key": "a", "value": "1"})
        );

        let reply = Reply::Ttl {
            key: "a".into(),
            ttl: -1,
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"key": "a", "ttl": -1})
        );
    }

    #[test]
    fn role_serde_lowercase() {
        let reply = Reply::ApiKey {
            api_key: "abc".into(),
            role: Role::Admin,
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"api_key": "abc", "role": "admin"})
        );
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn set_body_missing_fields_deserialize() {
        let body: SetBody = serde_json::from_value(json!({"key": "a"})).unwrap();
        assert_eq!(body.key.as_deref(), Some("a"));
        assert!(body.value.is_none());
        assert!(body.ttl.is_none());
    }

    #[test]
    fn non_integer_ttl_rejected() {
        let result: Result<ExpireBody, _> =
            serde_json::from_value(json!({"key": "a", "ttl": "ten"}));
        assert!(result.is_err());
    }
}
