pub mod storage;
pub use storage::KeyValueStore;
pub mod memory_store;
pub use memory_store::MemoryStore;
pub mod sqlite_store;
pub use sqlite_store::SqliteStore;
pub mod local_repo;
pub use local_repo::LocalRepository;

use std::sync::Arc;

use crate::common::error::AppError;

/// Escolhe o storage pela URL configurada: `memory` ou uma URL `sqlite:`.
pub async fn open_storage(url: &str) -> Result<Arc<dyn KeyValueStore>, AppError> {
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("memory") {
        tracing::info!("💾 Usando storage em memória");
        return Ok(Arc::new(MemoryStore::new()));
    }
    if url.starts_with("sqlite:") {
        return Ok(Arc::new(SqliteStore::connect(url).await?));
    }
    Err(AppError::Storage(format!("URL de storage não suportada: {}", url)))
}
