// src/models/item.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::volume::{self, QUANTITY_MIN, WeightClass, clamp_to_int, parse_number};
use crate::models::warehouse::{WarehouseId, validate_dimension};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id local, gerado enquanto o item não existe no servidor.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Item ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub unit_weight_kg: f64,
    pub quantity: u32,
    /// `None` = item solto (sem bodega).
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub weight_class: WeightClass,
    /// Nome da última bodega, para exibição depois que o item fica solto.
    #[serde(default)]
    pub last_warehouse_name: Option<String>,
}

impl Item {
    /// Volume de uma unidade. NaN (desconhecido) vira zero aqui.
    pub fn unit_volume(&self) -> f64 {
        let v = volume::volume(self.width, self.height, self.length);
        if v.is_finite() && v > 0.0 { v } else { 0.0 }
    }

    pub fn total_volume(&self) -> f64 {
        self.unit_volume() * f64::from(self.quantity)
    }

    pub fn size_class(&self) -> WeightClass {
        volume::size_class(self.unit_volume())
    }

    pub fn is_orphan(&self) -> bool {
        self.warehouse_id.is_none()
    }

    /// Solta o item da bodega, guardando o nome dela.
    pub fn detach(&mut self, warehouse_name: &str) {
        self.warehouse_id = None;
        self.last_warehouse_name = Some(warehouse_name.to_string());
    }

    /// Mesmo produto (para juntar quantidades numa movimentação).
    pub fn same_stock_as(&self, other: &Item) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.category.eq_ignore_ascii_case(&other.category)
            && self.width == other.width
            && self.height == other.height
            && self.length == other.length
            && self.unit_weight_kg == other.unit_weight_kg
    }
}

fn validate_weight(val: f64) -> Result<(), ValidationError> {
    if !val.is_finite() || val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El peso no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: SaveItem
// ---
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveItemPayload {
    #[serde(default)]
    pub id: Option<ItemId>,

    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    #[serde(default)]
    pub category: String,

    #[validate(custom(function = "validate_dimension"))]
    pub width: f64,

    #[validate(custom(function = "validate_dimension"))]
    pub height: f64,

    #[validate(custom(function = "validate_dimension"))]
    pub length: f64,

    #[validate(custom(function = "validate_weight"))]
    #[serde(default)]
    pub unit_weight_kg: f64,

    // Coagido para >= 1 antes de gravar
    #[serde(default)]
    pub quantity: u32,

    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

impl SaveItemPayload {
    pub fn normalized_quantity(&self) -> u32 {
        self.quantity.max(QUANTITY_MIN)
    }
}

/// Formulário de item como a UI entrega (texto cru).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub width: String,
    pub height: String,
    pub length: String,
    #[serde(default)]
    pub unit_weight_kg: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub warehouse_id: Option<String>,
}

impl ItemForm {
    pub fn into_payload(self) -> SaveItemPayload {
        SaveItemPayload {
            id: self
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(ItemId::new),
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            width: parse_number(self.width.as_str()),
            height: parse_number(self.height.as_str()),
            length: parse_number(self.length.as_str()),
            unit_weight_kg: parse_number(self.unit_weight_kg.as_str()),
            quantity: clamp_to_int(&self.quantity, QUANTITY_MIN),
            warehouse_id: self
                .warehouse_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(WarehouseId::new),
        }
    }
}

// ---
// Payload: MoveItem (movimentação parcial ou total)
// ---
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemPayload {
    pub id: ItemId,
    #[serde(default)]
    pub from_warehouse_id: Option<WarehouseId>,
    pub to_warehouse_id: WarehouseId,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Item {
        Item {
            id: ItemId::new("a"),
            name: "Caja".into(),
            category: "Cartón".into(),
            width: 0.5,
            height: 0.5,
            length: 0.4,
            unit_weight_kg: 2.0,
            quantity: 4,
            warehouse_id: Some(WarehouseId::from(1)),
            weight_class: WeightClass::Small,
            last_warehouse_name: None,
        }
    }

    #[test]
    fn volume_contribution_is_unit_volume_times_quantity() {
        let i = item();
        assert!((i.unit_volume() - 0.1).abs() < 1e-9);
        assert!((i.total_volume() - 0.4).abs() < 1e-9);
        assert_eq!(i.size_class(), WeightClass::Medium);
    }

    #[test]
    fn detach_keeps_the_last_warehouse_name() {
        let mut i = item();
        i.detach("Central");
        assert!(i.is_orphan());
        assert_eq!(i.last_warehouse_name.as_deref(), Some("Central"));
    }

    #[test]
    fn same_stock_ignores_case_and_location() {
        let a = item();
        let mut b = item();
        b.id = ItemId::new("b");
        b.name = "CAJA".into();
        b.warehouse_id = None;
        assert!(a.same_stock_as(&b));

        b.width = 0.6;
        assert!(!a.same_stock_as(&b));
    }

    #[test]
    fn form_clamps_quantity_and_parses_decimals() {
        let payload = ItemForm {
            name: " Caja ".into(),
            width: "0,5".into(),
            height: "1".into(),
            length: "1".into(),
            unit_weight_kg: "3,2".into(),
            quantity: "0".into(),
            warehouse_id: Some("  ".into()),
            ..Default::default()
        }
        .into_payload();

        assert_eq!(payload.name, "Caja");
        assert_eq!(payload.width, 0.5);
        assert_eq!(payload.unit_weight_kg, 3.2);
        assert_eq!(payload.quantity, 1);
        assert!(payload.warehouse_id.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payload_rejects_negative_weight() {
        let mut payload = ItemForm {
            name: "Caja".into(),
            width: "1".into(),
            height: "1".into(),
            length: "1".into(),
            ..Default::default()
        }
        .into_payload();
        assert!(payload.validate().is_ok());

        payload.unit_weight_kg = -1.0;
        assert!(payload.validate().is_err());
    }
}
