// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::LocalRepository,
    models::auth::{LoginUserPayload, RegisterUserPayload, Role, Session, User},
};

const PASSWORD_MIN_LEN: usize = 8;

pub struct AuthService {
    local_repo: LocalRepository,
    bcrypt_cost: u32,
    // Serializa o ciclo ler/alterar/gravar da lista `@users`
    users_guard: Mutex<()>,
}

impl AuthService {
    pub fn new(local_repo: LocalRepository) -> Self {
        Self::with_cost(local_repo, bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(local_repo: LocalRepository, bcrypt_cost: u32) -> Self {
        Self {
            local_repo,
            bcrypt_cost,
            users_guard: Mutex::new(()),
        }
    }

    pub async fn register(&self, mut payload: RegisterUserPayload) -> Result<User, AppError> {
        payload.name = payload.name.trim().to_string();
        payload.validate()?;
        check_password_strength(&payload.password)?;

        let email = normalize_email(&payload.email);
        let _guard = self.users_guard.lock().await;
        let mut users = self.local_repo.load_users().await;
        if users.iter().any(|u| normalize_email(&u.email) == email) {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing é caro: roda fora do executor
        let password = payload.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = User {
            id: Uuid::new_v4(),
            name: payload.name,
            email,
            role: payload.role.unwrap_or_default(),
            password_hash,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.local_repo.save_users(&users).await?;

        tracing::info!("👤 Usuário registrado: {} ({:?})", user.email, user.role);
        Ok(user)
    }

    pub async fn login(&self, payload: LoginUserPayload) -> Result<User, AppError> {
        let email = normalize_email(&payload.email);
        let user = self
            .local_repo
            .load_users()
            .await
            .into_iter()
            .find(|u| normalize_email(&u.email) == email)
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.local_repo
            .save_session(&Session {
                user_id: user.id,
                started_at: Utc::now(),
            })
            .await?;
        tracing::info!("🔓 Sessão iniciada para {}", user.email);
        Ok(user)
    }

    /// Reabre a sessão gravada. Se o usuário sumiu, a sessão é apagada (falha fechada).
    pub async fn restore_session(&self) -> Option<User> {
        let session = self.local_repo.load_session().await?;
        let user = self
            .local_repo
            .load_users()
            .await
            .into_iter()
            .find(|u| u.id == session.user_id);

        if user.is_none() {
            tracing::warn!("⚠️ Sessão aponta para usuário inexistente ({}), limpando", session.user_id);
            if let Err(e) = self.local_repo.clear_session().await {
                tracing::warn!("⚠️ Falha ao limpar a sessão: {}", e);
            }
        }
        user
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.local_repo.clear_session().await?;
        self.local_repo.clear_token().await?;
        tracing::info!("🔒 Sessão encerrada");
        Ok(())
    }

    /// Token Bearer usado pelo adaptador remoto. Vazio = remove.
    pub async fn set_api_token(&self, token: &str) -> Result<(), AppError> {
        let token = token.trim();
        if token.is_empty() {
            self.local_repo.clear_token().await
        } else {
            self.local_repo.save_token(token).await
        }
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.local_repo.load_users().await
    }

    pub async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let _guard = self.users_guard.lock().await;
        let mut users = self.local_repo.load_users().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::UserNotFound)?;
        user.role = role;
        let updated = user.clone();

        self.local_repo.save_users(&users).await?;
        tracing::info!("🛡️ Papel de {} alterado para {:?}", updated.email, role);
        Ok(updated)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::WeakPassword(format!(
            "La contraseña debe tener al menos {} caracteres.",
            PASSWORD_MIN_LEN
        )));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AppError::WeakPassword(
            "La contraseña debe combinar letras y números.".to_string(),
        ));
    }
    Ok(())
}
