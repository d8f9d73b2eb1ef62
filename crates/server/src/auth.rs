//! Gate de chaves de API.
//!
//! Toda requisição protegida é autorizada de forma independente a partir do
//! header `X-API-Key`. Não há sessão: o registro de chaves é configuração
//! (chaves estáticas do startup + chaves emitidas por `/generate_key`).

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use tidekv_common::{API_KEY_HEADER, AuthError};
use tidekv_protocol::Role;

use crate::{ApiError, AppState};

/// Identidade derivada da chave apresentada. Vive só durante a requisição.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn require_admin(&self) -> Result<(), AuthError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::User => Err(AuthError::Forbidden),
        }
    }
}

#[derive(Debug, Clone)]
struct KeyRecord {
    user_id: String,
    role: Role,
}

/// Conjunto de chaves aceitas.
pub struct AuthGate {
    configured: Vec<(String, KeyRecord)>,
    issued: DashMap<String, KeyRecord>,
}

impl AuthGate {
    /// Chaves vazias são descartadas: nunca podem autorizar nada.
    pub fn new(admin_keys: Vec<String>, user_keys: Vec<String>) -> Self {
        let admins = admin_keys.into_iter().map(|key| (key, Role::Admin));
        let users = user_keys.into_iter().map(|key| (key, Role::User));

        let configured = admins
            .chain(users)
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, role)| {
                let record = KeyRecord {
                    user_id: format!("config:{}", role.as_str()),
                    role,
                };
                (key, record)
            })
            .collect();

        Self {
            configured,
            issued: DashMap::new(),
        }
    }

    /// Valida a chave apresentada contra todas as chaves conhecidas.
    ///
    /// Ausente, vazia ou desconhecida resultam no mesmo `Unauthorized`. A
    /// comparação percorre o registro inteiro em tempo constante por chave.
    pub fn authorize(&self, presented: Option<&str>) -> Result<Principal, AuthError> {
        let presented = match presented {
            Some(key) if !key.is_empty() => key,
            _ => return Err(AuthError::Unauthorized),
        };

        let mut found = None;
        for (key, record) in &self.configured {
            if constant_time_compare(presented, key) && found.is_none() {
                found = Some(record.clone());
            }
        }
        for entry in self.issued.iter() {
            if constant_time_compare(presented, entry.key()) && found.is_none() {
                found = Some(entry.value().clone());
            }
        }

        found
            .map(|record| Principal {
                user_id: record.user_id,
                role: record.role,
            })
            .ok_or(AuthError::Unauthorized)
    }

    /// Emite uma nova chave de 32 caracteres hex (16 bytes aleatórios).
    pub fn generate_key(&self, user_id: String, role: Role) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let api_key = hex::encode(bytes);

        info!(user_id = %user_id, role = role.as_str(), "chave de API emitida");
        self.issued
            .insert(api_key.clone(), KeyRecord { user_id, role });
        api_key
    }

    /// Total de chaves aceitas (estáticas + emitidas).
    pub fn key_count(&self) -> usize {
        self.configured.len() + self.issued.len()
    }
}

/// Comparação em tempo constante, inclusive para tamanhos diferentes.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = a.len().max(b.len());

    // Padding com bytes diferentes garante desigualdade quando os tamanhos
    // divergem
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}

/// Middleware aplicado a todas as rotas protegidas: nenhuma operação roda
/// sem passar por aqui.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let principal = match state.auth.authorize(presented.as_deref()) {
        Ok(principal) => principal,
        Err(e) => {
            warn!(path = %req.uri().path(), "requisição sem chave de API válida");
            return Err(e.into());
        }
    };

    if let Some(key) = presented.as_deref() {
        state
            .request_log
            .record(&principal, key, req.uri().path());
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
