// src/services/bodega_api.rs

//! Adaptador remoto do serviço de bodegas (`/api/bodegas`).
//!
//! Só cuida de transporte: montar a requisição, anexar o token, mapear status e
//! decodificar o JSON para o modelo canônico. Não há retry: uma escrita que
//! falha é terminal e volta para quem chamou.

pub mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LocalRepository,
    models::warehouse::{SaveWarehousePayload, Warehouse},
};
use dto::{WarehouseWritePayload, error_envelope_message, extract_message, parse_warehouse_list};

#[async_trait]
pub trait BodegaApi: Send + Sync {
    async fn fetch_warehouses(&self) -> Result<Vec<Warehouse>, AppError>;

    async fn create_warehouse(
        &self,
        payload: &SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError>;

    async fn update_warehouse(
        &self,
        payload: &SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError>;
}

pub struct HttpBodegaApi {
    client: Client,
    endpoint: Url,
    // De onde sai o token Bearer (chave `@token`)
    local_repo: LocalRepository,
}

impl HttpBodegaApi {
    pub fn new(base_url: &str, timeout: Duration, local_repo: LocalRepository) -> Result<Self, AppError> {
        let endpoint = Url::parse(&format!("{}/api/bodegas", base_url.trim_end_matches('/')))
            .map_err(|e| anyhow::anyhow!("URL do serviço de bodegas inválida: {}", e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao criar o cliente HTTP: {}", e))?;
        Ok(Self {
            client,
            endpoint,
            local_repo,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.local_repo.load_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_write(
        &self,
        request: RequestBuilder,
        payload: &SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let body = WarehouseWritePayload::from_payload(payload, actor_id.map(|id| id.to_string()));
        let response = self
            .with_auth(request)
            .await
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }

        // 2xx com envelope de erro continua sendo erro
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            if let Some(message) = error_envelope_message(&value) {
                return Err(AppError::Remote(message));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BodegaApi for HttpBodegaApi {
    async fn fetch_warehouses(&self) -> Result<Vec<Warehouse>, AppError> {
        let response = self
            .with_auth(self.client.get(self.endpoint.clone()))
            .await
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Decode(format!("JSON inválido: {}", e)))?;
        let warehouses = parse_warehouse_list(value)?;
        tracing::debug!("📦 {} bodegas recebidas do servidor", warehouses.len());
        Ok(warehouses)
    }

    async fn create_warehouse(
        &self,
        payload: &SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let request = self.client.post(self.endpoint.clone());
        self.send_write(request, payload, actor_id).await
    }

    async fn update_warehouse(
        &self,
        payload: &SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let request = self.client.put(self.endpoint.clone());
        self.send_write(request, payload, actor_id).await
    }
}

fn map_transport_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Network(format!("tempo esgotado: {}", error))
    } else {
        AppError::Network(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AppError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| extract_message(&value))
        .unwrap_or_else(|| {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("El servidor respondió con estado {}.", status.as_u16())
            } else {
                format!("El servidor respondió con estado {}: {}", status.as_u16(), preview)
            }
        });
    AppError::Remote(message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{}...", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::envelope(br#"{"error":true,"body":"Nombre duplicado"}"#.as_slice(), "Nombre duplicado")]
    #[case::message(br#"{"message":"No autorizado"}"#.as_slice(), "No autorizado")]
    #[case::plain(b"Bad Gateway".as_slice(), "El servidor respondió con estado 502: Bad Gateway")]
    #[case::empty(b"".as_slice(), "El servidor respondió con estado 502.")]
    fn maps_status_errors_to_readable_messages(#[case] body: &[u8], #[case] expected: &str) {
        let error = map_status_error(StatusCode::BAD_GATEWAY, body);
        assert!(matches!(error, AppError::Remote(ref m) if m == expected), "got {:?}", error);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[test]
    fn endpoint_is_built_from_the_base_url() {
        let repo = LocalRepository::new(std::sync::Arc::new(crate::db::MemoryStore::new()));
        let api = HttpBodegaApi::new("http://localhost:3000/", Duration::from_secs(1), repo).unwrap();
        assert_eq!(api.endpoint().as_str(), "http://localhost:3000/api/bodegas");
    }
}
