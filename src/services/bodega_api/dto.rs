// src/services/bodega_api/dto.rs

//! Formato de wire do serviço de bodegas. Os nomes mistos (espanhol/inglês) e
//! os tipos frouxos (`is_active` como 0/1, ids numéricos ou texto) param aqui:
//! daqui para fora só circula o `Warehouse` canônico.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    common::{
        error::AppError,
        volume::{RawNumber, deserialize_lenient_f64},
    },
    models::warehouse::{CapacitySnapshot, SaveWarehousePayload, Warehouse, WarehouseId},
};

#[derive(Debug, Deserialize)]
pub(crate) struct WarehouseDto {
    #[serde(alias = "id_bodega", deserialize_with = "deserialize_id")]
    id: String,
    #[serde(alias = "nombre", default)]
    name: String,
    #[serde(alias = "direccion", default)]
    address: String,
    #[serde(alias = "ciudad", default)]
    city: String,
    #[serde(alias = "ancho", default, deserialize_with = "deserialize_lenient_f64")]
    width: f64,
    #[serde(alias = "alto", default, deserialize_with = "deserialize_lenient_f64")]
    height: f64,
    #[serde(alias = "largo", default, deserialize_with = "deserialize_lenient_f64")]
    length: f64,
    #[serde(
        alias = "is_active",
        alias = "activo",
        default = "default_active",
        deserialize_with = "deserialize_lenient_bool"
    )]
    active: bool,
    #[serde(alias = "capacidad", default, deserialize_with = "deserialize_optional_f64")]
    capacity: Option<f64>,
    #[serde(alias = "ocupado", default, deserialize_with = "deserialize_optional_f64")]
    occupied: Option<f64>,
}

fn default_active() -> bool {
    true
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n
            .as_i64()
            .map(|i| i.to_string())
            .unwrap_or_else(|| n.to_string())),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(serde::de::Error::custom(format!("id inválido: {}", other))),
    }
}

fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "inactivo" | "inactive"
        ),
        _ => default_active(),
    })
}

fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .filter(|v| !v.is_null())
        .map(|v| v.parse_number()))
}

impl WarehouseDto {
    pub(crate) fn into_domain(self) -> Warehouse {
        let capacity_snapshot = self.capacity.map(|capacity| CapacitySnapshot {
            capacity,
            occupied: self.occupied.unwrap_or(0.0),
        });
        Warehouse {
            id: WarehouseId::new(self.id),
            name: self.name,
            address: self.address,
            city: self.city,
            width: self.width,
            height: self.height,
            length: self.length,
            active: self.active,
            layout: None,
            capacity_snapshot,
            local_active: None,
        }
    }
}

/// Corpo de POST/PUT `/api/bodegas`.
#[derive(Debug, Serialize)]
pub(crate) struct WarehouseWritePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    nombre: &'a str,
    direccion: &'a str,
    ciudad: &'a str,
    ancho: f64,
    alto: f64,
    largo: f64,
    is_active: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    usuario_id: Option<String>,
}

impl<'a> WarehouseWritePayload<'a> {
    pub(crate) fn from_payload(payload: &'a SaveWarehousePayload, actor_id: Option<String>) -> Self {
        // Id numérico volta como número; ids locais não vão para o servidor
        let id = payload
            .id
            .as_ref()
            .filter(|id| !id.is_local())
            .map(|id| match id.as_str().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::from(id.as_str()),
            });
        Self {
            id,
            nombre: &payload.name,
            direccion: &payload.address,
            ciudad: &payload.city,
            ancho: payload.width,
            alto: payload.height,
            largo: payload.length,
            is_active: u8::from(payload.active.unwrap_or(true)),
            usuario_id: actor_id,
        }
    }
}

/// Mensagem do envelope de erro `{ "error": true, "body": "..." }`, se houver.
pub(crate) fn error_envelope_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    let flagged = match object.get("error") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    };
    if !flagged {
        return None;
    }
    Some(extract_message(value).unwrap_or_else(|| "Error desconocido del servidor.".to_string()))
}

/// Melhor mensagem legível num corpo JSON qualquer.
pub(crate) fn extract_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    ["body", "message", "mensaje", "error"]
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Lista de bodegas: array puro ou `{ "body": [...] }`.
pub(crate) fn parse_warehouse_list(value: Value) -> Result<Vec<Warehouse>, AppError> {
    if let Some(message) = error_envelope_message(&value) {
        return Err(AppError::Remote(message));
    }

    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => match object.remove("body") {
            Some(body @ Value::Array(_)) => body,
            _ => {
                return Err(AppError::Decode(
                    "se esperaba una lista de bodegas en 'body'".to_string(),
                ));
            }
        },
        _ => {
            return Err(AppError::Decode(
                "se esperaba una lista de bodegas".to_string(),
            ));
        }
    };

    let dtos: Vec<WarehouseDto> =
        serde_json::from_value(list).map_err(|e| AppError::Decode(e.to_string()))?;
    Ok(dtos.into_iter().map(WarehouseDto::into_domain).collect())
}
