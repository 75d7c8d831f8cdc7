// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;

use crate::{
    db::{self, LocalRepository},
    services::{auth::AuthService, bodega_api::HttpBodegaApi, inventory_store::InventoryStore},
};

const DEFAULT_BODEGAS_URL: &str = "http://localhost:3000";
const DEFAULT_STORAGE_URL: &str = "memory";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bodegas_url: String,
    pub storage_url: String,
    pub http_timeout: Duration,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// Lê o `.env` (se existir) e as variáveis `CUBICAJE_*`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs: u64 = parse_var(&read, "CUBICAJE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let bcrypt_cost: u32 = parse_var(&read, "CUBICAJE_BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        anyhow::ensure!(
            (4..=31).contains(&bcrypt_cost),
            "CUBICAJE_BCRYPT_COST deve estar entre 4 e 31 (recebido {})",
            bcrypt_cost
        );

        Ok(Self {
            bodegas_url: read("CUBICAJE_BODEGAS_URL").unwrap_or_else(|| DEFAULT_BODEGAS_URL.to_string()),
            storage_url: read("CUBICAJE_STORAGE_URL").unwrap_or_else(|| DEFAULT_STORAGE_URL.to_string()),
            http_timeout: Duration::from_secs(timeout_secs),
            bcrypt_cost,
        })
    }
}

fn parse_var<T, R>(read: &R, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    R: Fn(&str) -> Option<String>,
{
    match read(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} inválida: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<InventoryStore>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let storage = db::open_storage(&config.storage_url)
            .await
            .context("Falha ao abrir o storage local")?;

        // --- Monta o gráfico de dependências ---
        let local_repo = LocalRepository::new(storage);
        let api = HttpBodegaApi::new(&config.bodegas_url, config.http_timeout, local_repo.clone())
            .context("Falha ao criar o adaptador de bodegas")?;
        tracing::info!("🌐 Serviço de bodegas em {}", api.endpoint());

        let store = Arc::new(InventoryStore::new(local_repo.clone(), Arc::new(api)));
        let auth_service = Arc::new(AuthService::with_cost(local_repo, config.bcrypt_cost));

        Ok(Self {
            config,
            store,
            auth_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bodegas_url, DEFAULT_BODEGAS_URL);
        assert_eq!(config.storage_url, "memory");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CUBICAJE_BODEGAS_URL", " http://bodegas:8080 "),
            ("CUBICAJE_STORAGE_URL", "sqlite://cubicaje.db"),
            ("CUBICAJE_HTTP_TIMEOUT_SECS", "3"),
            ("CUBICAJE_BCRYPT_COST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.bodegas_url, "http://bodegas:8080");
        assert_eq!(config.storage_url, "sqlite://cubicaje.db");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.bcrypt_cost, 4);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        assert!(AppConfig::from_lookup(lookup(&[("CUBICAJE_HTTP_TIMEOUT_SECS", "dez")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("CUBICAJE_BCRYPT_COST", "2")])).is_err());
    }

    #[tokio::test]
    async fn state_assembles_with_in_memory_storage() {
        let config = AppConfig::from_lookup(lookup(&[("CUBICAJE_BCRYPT_COST", "4")])).unwrap();
        let state = AppState::from_config(config).await.unwrap();
        assert!(state.store.warehouses().await.is_empty());
        assert!(state.auth_service.list_users().await.is_empty());
    }
}
