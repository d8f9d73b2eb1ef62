use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tidekv_common::{AuthError, CommandError, StorageError, TideError};
use tidekv_protocol::wire::ErrorBody;

/// Erro na borda HTTP: achata os tipos internos em status + `{error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    BadRequest(String),
    NotFound(&'static str),
    Conflict(&'static str),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> String {
        match self {
            // Mesma mensagem para chave ausente, vazia ou errada
            ApiError::Unauthorized => "Unauthorized. Invalid API Key".into(),
            ApiError::Forbidden => "Forbidden. Admin access required".into(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(msg) | ApiError::Conflict(msg) => (*msg).into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::KeyNotFound => ApiError::NotFound("Key not found"),
            StorageError::FieldNotFound => ApiError::NotFound("Field not found"),
            StorageError::QueueEmpty => ApiError::NotFound("Queue is empty"),
            StorageError::WrongType => ApiError::Conflict(
                "WRONGTYPE Operation against a key holding the wrong kind of value",
            ),
            StorageError::NotAnInteger => {
                ApiError::BadRequest("value is not an integer or out of range".into())
            }
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        let msg = match e {
            CommandError::MissingField(field) => format!("{field} is required"),
            CommandError::InvalidTtl(ttl) => {
                format!("ttl must be a positive integer, got {ttl}")
            }
            CommandError::InvalidRole(role) => {
                format!("role must be 'admin' or 'user', got '{role}'")
            }
            CommandError::Unknown(name) => format!("unknown command '{name}'"),
            CommandError::WrongArity(name) => {
                format!("wrong number of arguments for '{name}'")
            }
            CommandError::InvalidArgument(msg) => msg,
        };
        ApiError::BadRequest(msg)
    }
}

impl From<TideError> for ApiError {
    fn from(e: TideError) -> Self {
        match e {
            TideError::Storage(e) => e.into(),
            TideError::Command(e) => e.into(),
            TideError::Auth(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
