// src/models/request.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::warehouse::WarehouseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

// --- Solicitação de desativação de bodega ---
// Criada por um usuário comum, resolvida por um admin. Terminal depois de resolvida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivationRequest {
    pub id: Uuid,
    pub warehouse_id: WarehouseId,
    pub user_id: Uuid,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DeactivationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeactivationPayload {
    pub warehouse_id: WarehouseId,
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 500, message = "Indica el motivo de la solicitud."))]
    pub reason: String,
}
