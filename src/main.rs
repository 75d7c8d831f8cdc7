// src/main.rs

use cubicaje::{config::AppState, services::inventory_store::SyncOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, só o nosso crate em `info`
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cubicaje=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await?;
    let store = &app_state.store;

    store.hydrate().await;

    match app_state.auth_service.restore_session().await {
        Some(user) => tracing::info!("👤 Sessão restaurada: {} ({:?})", user.email, user.role),
        None => tracing::info!("👤 Nenhuma sessão ativa"),
    }

    match store.load_warehouses().await? {
        SyncOutcome::Remote => tracing::info!("✅ Bodegas sincronizadas com o servidor"),
        SyncOutcome::Cached { reason } => {
            tracing::warn!("⚠️ Servidor indisponível, usando cache local: {}", reason)
        }
        SyncOutcome::Stale => {}
    }

    let metrics = store.all_metrics().await;
    if metrics.is_empty() {
        tracing::info!("📭 Nenhuma bodega cadastrada");
    }
    for (warehouse, m) in metrics {
        tracing::info!(
            "🏬 {} [{}] capacidade {:.2} m³ | ocupado {:.2} m³ | livre {:.2} m³ ({:.0}%)",
            warehouse.name,
            if warehouse.active { "ativa" } else { "inativa" },
            m.capacity,
            m.occupied,
            m.free,
            m.utilization() * 100.0
        );
    }

    let orphans = store.orphan_items().await;
    if !orphans.is_empty() {
        tracing::warn!("📦 {} itens sem bodega", orphans.len());
    }
    Ok(())
}
