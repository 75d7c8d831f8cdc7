// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Empleado,
    Cliente,
}

// Usuário como fica guardado no storage local (`@users`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    // Hash bcrypt. Precisa ser serializado porque a lista de usuários vive no storage local.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// Dados para registro de um novo usuário
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,
    #[validate(email(message = "El correo no es válido."))]
    pub email: String,
    // Política de senha é checada no serviço (AppError::WeakPassword)
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

// Dados para login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUserPayload {
    pub email: String,
    pub password: String,
}

/// Sessão ativa: só o id do usuário é persistido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
}
