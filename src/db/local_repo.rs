// src/db/local_repo.rs

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    common::error::AppError,
    db::storage::{
        ITEMS_KEY, KeyValueStore, REQUESTS_KEY, SESSION_KEY, TOKEN_KEY, USERS_KEY, WAREHOUSES_KEY,
    },
    models::{
        auth::{Session, User},
        item::Item,
        request::DeactivationRequest,
        warehouse::Warehouse,
    },
};

// O repositório local: coleções tipadas sobre o storage chave/valor.
// Leituras nunca falham para quem chama: JSON quebrado vira coleção vazia.
#[derive(Clone)]
pub struct LocalRepository {
    storage: Arc<dyn KeyValueStore>,
}

impl LocalRepository {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("⚠️ Falha ao ler '{}' do storage: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("⚠️ JSON inválido em '{}', usando valor vazio: {}", key, e);
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        self.storage.set(key, &raw).await
    }

    // --- Bodegas ---
    pub async fn load_warehouses(&self) -> Vec<Warehouse> {
        self.read_json(WAREHOUSES_KEY).await.unwrap_or_default()
    }

    pub async fn save_warehouses(&self, warehouses: &[Warehouse]) -> Result<(), AppError> {
        self.write_json(WAREHOUSES_KEY, warehouses).await
    }

    // --- Itens ---
    pub async fn load_items(&self) -> Vec<Item> {
        self.read_json(ITEMS_KEY).await.unwrap_or_default()
    }

    pub async fn save_items(&self, items: &[Item]) -> Result<(), AppError> {
        self.write_json(ITEMS_KEY, items).await
    }

    // --- Solicitações ---
    pub async fn load_requests(&self) -> Vec<DeactivationRequest> {
        self.read_json(REQUESTS_KEY).await.unwrap_or_default()
    }

    pub async fn save_requests(&self, requests: &[DeactivationRequest]) -> Result<(), AppError> {
        self.write_json(REQUESTS_KEY, requests).await
    }

    // --- Usuários ---
    pub async fn load_users(&self) -> Vec<User> {
        self.read_json(USERS_KEY).await.unwrap_or_default()
    }

    pub async fn save_users(&self, users: &[User]) -> Result<(), AppError> {
        self.write_json(USERS_KEY, users).await
    }

    // --- Sessão ---
    pub async fn load_session(&self) -> Option<Session> {
        self.read_json(SESSION_KEY).await
    }

    pub async fn save_session(&self, session: &Session) -> Result<(), AppError> {
        self.write_json(SESSION_KEY, session).await
    }

    pub async fn clear_session(&self) -> Result<(), AppError> {
        self.storage.remove(SESSION_KEY).await
    }

    // --- Token (texto puro, não JSON) ---
    pub async fn load_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!("⚠️ Falha ao ler o token do storage: {}", e);
                None
            }
        }
    }

    pub async fn save_token(&self, token: &str) -> Result<(), AppError> {
        self.storage.set(TOKEN_KEY, token).await
    }

    pub async fn clear_token(&self) -> Result<(), AppError> {
        self.storage.remove(TOKEN_KEY).await
    }
}
