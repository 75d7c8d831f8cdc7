// src/common/error.rs

use thiserror::Error;

/// Taxonomia dos erros, do ponto de vista de quem chama (UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sem resposta ou falha de conexão.
    Network,
    /// HTTP não-2xx ou envelope `{error: true, body}`.
    Server,
    /// Campo obrigatório, número inválido, senha fraca, e-mail duplicado, sem espaço.
    Validation,
    /// Conflito lógico (solicitação pendente duplicada, quantidade maior que a disponível).
    Conflict,
    NotFound,
    Internal,
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Falha de rede: {0}")]
    Network(String),

    #[error("Erro do servidor: {0}")]
    Remote(String),

    #[error("Resposta inválida do servidor: {0}")]
    Decode(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Senha fraca: {0}")]
    WeakPassword(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Bodega não encontrada: {0}")]
    WarehouseNotFound(String),

    #[error("Bodega inativa: {0}")]
    WarehouseInactive(String),

    #[error("Item não encontrado: {0}")]
    ItemNotFound(String),

    #[error("Solicitação não encontrada: {0}")]
    RequestNotFound(String),

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Já existe uma solicitação pendente para a bodega {0}")]
    DuplicatePendingRequest(String),

    #[error("Solicitação já resolvida")]
    RequestAlreadyResolved,

    #[error("Quantidade inválida: {requested} (disponível: {available})")]
    InvalidMoveQuantity { requested: u32, available: u32 },

    #[error("Quantidade acima do limite no item {0}")]
    QuantityOverflow(String),

    #[error("Espaço insuficiente: necessário {required:.3} m³, livre {free:.3} m³")]
    InsufficientCapacity { required: f64, free: f64 },

    #[error("Erro de storage: {0}")]
    Storage(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network(_) => ErrorKind::Network,
            AppError::Remote(_) | AppError::Decode(_) => ErrorKind::Server,
            AppError::ValidationError(_)
            | AppError::EmailAlreadyExists
            | AppError::WeakPassword(_)
            | AppError::InvalidCredentials
            | AppError::WarehouseInactive(_)
            | AppError::InsufficientCapacity { .. } => ErrorKind::Validation,
            AppError::DuplicatePendingRequest(_)
            | AppError::RequestAlreadyResolved
            | AppError::InvalidMoveQuantity { .. }
            | AppError::QuantityOverflow(_) => ErrorKind::Conflict,
            AppError::WarehouseNotFound(_)
            | AppError::ItemNotFound(_)
            | AppError::RequestNotFound(_)
            | AppError::UserNotFound => ErrorKind::NotFound,
            AppError::Storage(_)
            | AppError::DatabaseError(_)
            | AppError::Serialization(_)
            | AppError::BcryptError(_)
            | AppError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// A mensagem única, legível, que a UI mostra ao usuário.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => {
                let mut messages: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, field_errors)| {
                        field_errors.iter().map(move |e| match &e.message {
                            Some(m) => m.to_string(),
                            None => format!("El campo '{}' es inválido.", field),
                        })
                    })
                    .collect();
                messages.sort();
                if messages.is_empty() {
                    "Uno o más campos son inválidos.".to_string()
                } else {
                    messages.join(" ")
                }
            }
            AppError::Network(_) => {
                "No se pudo conectar con el servidor. Revisa tu conexión.".to_string()
            }
            AppError::Remote(message) => message.clone(),
            AppError::Decode(_) => "El servidor respondió con un formato inesperado.".to_string(),
            AppError::EmailAlreadyExists => "Este correo ya está registrado.".to_string(),
            AppError::WeakPassword(reason) => reason.clone(),
            AppError::InvalidCredentials => "Correo o contraseña inválidos.".to_string(),
            AppError::WarehouseNotFound(_) => "La bodega no existe.".to_string(),
            AppError::WarehouseInactive(name) => {
                format!("La bodega '{}' está inactiva y no puede recibir ítems.", name)
            }
            AppError::ItemNotFound(_) => "El ítem no existe.".to_string(),
            AppError::RequestNotFound(_) => "La solicitud no existe.".to_string(),
            AppError::UserNotFound => "Usuario no encontrado.".to_string(),
            AppError::DuplicatePendingRequest(_) => {
                "Ya existe una solicitud pendiente para esta bodega.".to_string()
            }
            AppError::RequestAlreadyResolved => "La solicitud ya fue resuelta.".to_string(),
            AppError::InvalidMoveQuantity { available, .. } => {
                format!("La cantidad debe estar entre 1 y {}.", available)
            }
            AppError::QuantityOverflow(_) => {
                "La cantidad resultante supera el máximo permitido.".to_string()
            }
            AppError::InsufficientCapacity { required, free } => format!(
                "La bodega destino no tiene espacio suficiente ({:.3} m³ requeridos, {:.3} m³ libres).",
                required, free
            ),
            // Todos os outros erros viram uma mensagem genérica.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            e => {
                tracing::error!("Erro interno: {:?}", e);
                "Ocurrió un error inesperado.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn validation_messages_are_flattened() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("El nombre es obligatorio.".into());
        errors.add("name", err);

        let error = AppError::from(errors);
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.user_message(), "El nombre es obligatorio.");
    }

    #[test]
    fn remote_errors_surface_the_server_message() {
        let error = AppError::Remote("Bodega duplicada".into());
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.user_message(), "Bodega duplicada");
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = AppError::Storage("disk full".into());
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(error.user_message(), "Ocurrió un error inesperado.");
    }

    #[test]
    fn conflicts_are_classified() {
        let error = AppError::InvalidMoveQuantity { requested: 9, available: 5 };
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert!(error.user_message().contains('5'));
    }
}
