// src/db/storage.rs

use async_trait::async_trait;

use crate::common::error::AppError;

// Chaves do storage local: uma por coleção lógica
pub const WAREHOUSES_KEY: &str = "@bodegas";
pub const ITEMS_KEY: &str = "@items";
pub const REQUESTS_KEY: &str = "@bodega_requests";
pub const USERS_KEY: &str = "@users";
pub const SESSION_KEY: &str = "@session";
pub const TOKEN_KEY: &str = "@token";

/// Storage chave/valor assíncrono. A implementação concreta (memória, SQLite)
/// fica escondida atrás deste trait; o handle é adquirido a cada chamada.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
