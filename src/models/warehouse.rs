// src/models/warehouse.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::volume::{self, parse_number};
use crate::models::item::Item;

// --- Identidade ---
// Numérica no servidor, string local ("local-<uuid>") antes de sincronizar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseId(String);

const LOCAL_ID_PREFIX: &str = "local-";

impl WarehouseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn local() -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WarehouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for WarehouseId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for WarehouseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// --- Layout (grade de células) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Free,
    Occupied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseLayout {
    /// Células por lado da grade.
    pub resolution: u32,
    /// Chave "linha:coluna". Célula ausente = livre.
    #[serde(default)]
    pub cells: BTreeMap<String, CellState>,
}

impl WarehouseLayout {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1),
            cells: BTreeMap::new(),
        }
    }

    fn cell_key(row: u32, col: u32) -> String {
        format!("{}:{}", row, col)
    }

    pub fn cell(&self, row: u32, col: u32) -> CellState {
        self.cells
            .get(&Self::cell_key(row, col))
            .copied()
            .unwrap_or(CellState::Free)
    }

    /// Alterna a célula. `None` se estiver fora da grade.
    pub fn toggle(&mut self, row: u32, col: u32) -> Option<CellState> {
        if row >= self.resolution || col >= self.resolution {
            return None;
        }
        let next = match self.cell(row, col) {
            CellState::Free => CellState::Occupied,
            CellState::Occupied => CellState::Free,
        };
        let key = Self::cell_key(row, col);
        match next {
            CellState::Free => {
                self.cells.remove(&key);
            }
            CellState::Occupied => {
                self.cells.insert(key, next);
            }
        }
        Some(next)
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells
            .values()
            .filter(|state| **state == CellState::Occupied)
            .count()
    }
}

/// Última capacidade conhecida, como informada pelo servidor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub capacity: f64,
    pub occupied: f64,
}

// --- Bodega ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub active: bool,
    #[serde(default)]
    pub layout: Option<WarehouseLayout>,
    #[serde(default)]
    pub capacity_snapshot: Option<CapacitySnapshot>,
    /// Ativação decidida aqui (toggle de admin ou solicitação aprovada).
    /// Prevalece sobre o `active` do servidor nas sincronizações.
    #[serde(default)]
    pub local_active: Option<bool>,
}

impl Warehouse {
    /// Volume total em m³. Zero quando alguma dimensão falta ou não é positiva.
    pub fn capacity(&self) -> f64 {
        let dims = [self.width, self.height, self.length];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return 0.0;
        }
        volume::volume(self.width, self.height, self.length)
    }
}

/// Métricas derivadas por bodega. Nunca persistidas, sempre recalculadas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseMetrics {
    pub capacity: f64,
    pub occupied: f64,
    pub free: f64,
}

impl WarehouseMetrics {
    /// Considera só os itens que pertencem a `warehouse`; os demais são ignorados.
    pub fn compute<'a, I>(warehouse: &Warehouse, items: I) -> Self
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let capacity = warehouse.capacity();
        let occupied: f64 = items
            .into_iter()
            .filter(|item| item.warehouse_id.as_ref() == Some(&warehouse.id))
            .map(Item::total_volume)
            .sum();
        Self {
            capacity,
            occupied,
            free: (capacity - occupied).max(0.0),
        }
    }

    /// Fração ocupada (0..=1, pode passar de 1 se estiver superlotada). Zero sem capacidade.
    pub fn utilization(&self) -> f64 {
        if self.capacity > 0.0 {
            self.occupied / self.capacity
        } else {
            0.0
        }
    }
}

// ---
// Validação Customizada
// ---
pub(crate) fn validate_dimension(val: f64) -> Result<(), ValidationError> {
    if !val.is_finite() || val <= 0.0 {
        let mut err = ValidationError::new("range");
        err.message = Some("Las dimensiones deben ser mayores que cero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: SaveWarehouse (insert se `id` ausente, update caso contrário)
// ---
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveWarehousePayload {
    #[serde(default)]
    pub id: Option<WarehouseId>,

    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub city: String,

    #[validate(custom(function = "validate_dimension"))]
    pub width: f64,

    #[validate(custom(function = "validate_dimension"))]
    pub height: f64,

    #[validate(custom(function = "validate_dimension"))]
    pub length: f64,

    #[serde(default)]
    pub active: Option<bool>,
}

/// Campos do formulário de bodega, como a UI os entrega (texto cru).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseForm {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub width: String,
    pub height: String,
    pub length: String,
}

impl WarehouseForm {
    pub fn into_payload(self) -> SaveWarehousePayload {
        SaveWarehousePayload {
            id: self
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(WarehouseId::new),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            width: parse_number(self.width.as_str()),
            height: parse_number(self.height.as_str()),
            length: parse_number(self.length.as_str()),
            active: None,
        }
    }
}
