// src/services/inventory_store.rs

//! O store do domínio: bodegas, itens e solicitações de desativação em memória,
//! sincronizados com o serviço remoto de bodegas e gravados no storage local.
//!
//! Todo o estado fica atrás de um único `Mutex`. Uma mutação com vários passos
//! (ex.: soltar os itens e desligar a bodega) acontece sob a mesma guarda, então
//! nenhuma leitura de métricas enxerga o meio do caminho. A guarda também
//! cobre a gravação local, o que mantém as escritas no storage em ordem.
//! Chamadas de rede nunca seguram a guarda.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{error::AppError, generation::Generation, volume::weight_class},
    db::LocalRepository,
    models::{
        item::{Item, ItemId, MoveItemPayload, SaveItemPayload},
        request::{CreateDeactivationPayload, DeactivationRequest, RequestStatus},
        warehouse::{
            CellState, SaveWarehousePayload, Warehouse, WarehouseId, WarehouseLayout,
            WarehouseMetrics,
        },
    },
    services::bodega_api::BodegaApi,
};

/// De onde vieram as bodegas depois de um `load_warehouses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Remote,
    /// O servidor falhou; ficou valendo o cache local. Traz a mensagem para a UI.
    Cached { reason: String },
    /// Uma sincronização mais nova começou no meio; esta resposta foi descartada.
    Stale,
}

#[derive(Debug, Default)]
struct StoreState {
    warehouses: Vec<Warehouse>,
    items: Vec<Item>,
    requests: Vec<DeactivationRequest>,
}

// Quais coleções uma mutação tocou (e precisam ser gravadas)
#[derive(Debug, Clone, Copy, Default)]
struct Touched {
    warehouses: bool,
    items: bool,
    requests: bool,
}

impl Touched {
    const WAREHOUSES: Self = Self { warehouses: true, items: false, requests: false };
    const ITEMS: Self = Self { warehouses: false, items: true, requests: false };
    const REQUESTS: Self = Self { warehouses: false, items: false, requests: true };
    const WAREHOUSES_AND_ITEMS: Self = Self { warehouses: true, items: true, requests: false };
    const ALL: Self = Self { warehouses: true, items: true, requests: true };
}

pub struct InventoryStore {
    local_repo: LocalRepository,
    api: Arc<dyn BodegaApi>,
    state: Mutex<StoreState>,
    sync_generation: Generation,
}

impl InventoryStore {
    pub fn new(local_repo: LocalRepository, api: Arc<dyn BodegaApi>) -> Self {
        Self {
            local_repo,
            api,
            state: Mutex::new(StoreState::default()),
            sync_generation: Generation::new(),
        }
    }

    // Gravação "fire-and-forget": falha no storage é logada, não desfaz a mutação.
    async fn persist(&self, state: &StoreState, touched: Touched) {
        if touched.warehouses {
            if let Err(e) = self.local_repo.save_warehouses(&state.warehouses).await {
                tracing::warn!("⚠️ Falha ao gravar bodegas no storage local: {}", e);
            }
        }
        if touched.items {
            if let Err(e) = self.local_repo.save_items(&state.items).await {
                tracing::warn!("⚠️ Falha ao gravar itens no storage local: {}", e);
            }
        }
        if touched.requests {
            if let Err(e) = self.local_repo.save_requests(&state.requests).await {
                tracing::warn!("⚠️ Falha ao gravar solicitações no storage local: {}", e);
            }
        }
    }

    async fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().await
    }

    // =========================================================================
    //  1. CARGA E SINCRONIZAÇÃO
    // =========================================================================

    /// Carrega o último snapshot do storage local.
    pub async fn hydrate(&self) {
        let warehouses = self.local_repo.load_warehouses().await;
        let items = self.local_repo.load_items().await;
        let requests = self.local_repo.load_requests().await;

        let mut state = self.lock().await;
        tracing::info!(
            "💾 Estado local carregado: {} bodegas, {} itens, {} solicitações",
            warehouses.len(),
            items.len(),
            requests.len()
        );
        state.warehouses = warehouses;
        state.items = items;
        state.requests = requests;
    }

    /// Busca as bodegas no servidor e substitui o cache inteiro.
    /// Se o servidor falhar, volta para o último snapshot local.
    pub async fn load_warehouses(&self) -> Result<SyncOutcome, AppError> {
        let ticket = self.sync_generation.begin();

        match self.api.fetch_warehouses().await {
            Ok(remote) => {
                let mut state = self.lock().await;
                if !ticket.is_current() {
                    tracing::warn!("⏭️ Resposta de sincronização antiga descartada (geração {})", ticket.id());
                    return Ok(SyncOutcome::Stale);
                }
                let touched = replace_warehouses(&mut state, remote);
                self.persist(&state, touched).await;
                tracing::info!("🔄 {} bodegas sincronizadas com o servidor", state.warehouses.len());
                Ok(SyncOutcome::Remote)
            }
            Err(e) => {
                tracing::warn!("⚠️ Falha ao buscar bodegas, usando cache local: {}", e);
                let cached = self.local_repo.load_warehouses().await;
                let mut state = self.lock().await;
                if !ticket.is_current() {
                    return Ok(SyncOutcome::Stale);
                }
                state.warehouses = cached;
                Ok(SyncOutcome::Cached {
                    reason: e.user_message(),
                })
            }
        }
    }

    /// Descarta o resultado de qualquer sincronização em andamento (ex.: no logout).
    pub fn cancel_sync(&self) {
        self.sync_generation.cancel_all();
    }

    /// Cria (sem `id`, ou com id local de rascunho) ou atualiza uma bodega no servidor.
    /// Sucesso: recarrega a lista inteira. Falha: nada muda localmente.
    pub async fn save_warehouse(
        &self,
        payload: SaveWarehousePayload,
        actor_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        payload.validate()?;

        let is_update = payload.id.as_ref().is_some_and(|id| !id.is_local());
        if is_update {
            self.api.update_warehouse(&payload, actor_id).await?;
            tracing::info!("✅ Bodega '{}' atualizada no servidor", payload.name);
        } else {
            self.api.create_warehouse(&payload, actor_id).await?;
            tracing::info!("✅ Bodega '{}' criada no servidor", payload.name);
        }

        // Nada de merge otimista: a verdade é a lista do servidor
        let ticket = self.sync_generation.begin();
        let remote = self.api.fetch_warehouses().await?;

        let mut state = self.lock().await;
        if !ticket.is_current() {
            tracing::warn!("⏭️ Recarga pós-escrita descartada (geração {})", ticket.id());
            return Ok(());
        }
        // Ativação explícita no formulário vale mais que o toggle local anterior
        if let (Some(id), Some(_)) = (payload.id.as_ref(), payload.active) {
            if let Some(previous) = state.warehouses.iter_mut().find(|w| &w.id == id) {
                previous.local_active = None;
            }
        }
        let touched = replace_warehouses(&mut state, remote);
        self.persist(&state, touched).await;
        Ok(())
    }

    // =========================================================================
    //  2. BODEGAS (operações locais)
    // =========================================================================

    /// Liga/desliga a bodega. Desligar solta os itens dela no mesmo passo.
    /// Devolve `false` se a bodega não existe.
    pub async fn set_warehouse_active(&self, id: &WarehouseId, active: bool) -> bool {
        let mut state = self.lock().await;
        if !set_active_locked(&mut state, id, active) {
            return false;
        }
        let touched = if active { Touched::WAREHOUSES } else { Touched::WAREHOUSES_AND_ITEMS };
        self.persist(&state, touched).await;
        true
    }

    /// Solta os itens da bodega e depois a remove da coleção.
    pub async fn delete_warehouse_orphan_items(&self, id: &WarehouseId) -> bool {
        let mut state = self.lock().await;
        let Some(index) = state.warehouses.iter().position(|w| &w.id == id) else {
            return false;
        };

        let removed = state.warehouses.remove(index);
        let orphaned = orphan_items(&mut state.items, &removed);
        tracing::info!(
            "🗑️ Bodega '{}' removida; {} itens ficaram soltos",
            removed.name,
            orphaned
        );
        self.persist(&state, Touched::WAREHOUSES_AND_ITEMS).await;
        true
    }

    /// Troca a resolução da grade (a grade é zerada).
    pub async fn set_layout_resolution(
        &self,
        id: &WarehouseId,
        resolution: u32,
    ) -> Result<WarehouseLayout, AppError> {
        let mut state = self.lock().await;
        let warehouse = state
            .warehouses
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| AppError::WarehouseNotFound(id.to_string()))?;

        let layout = WarehouseLayout::new(resolution);
        warehouse.layout = Some(layout.clone());
        self.persist(&state, Touched::WAREHOUSES).await;
        Ok(layout)
    }

    pub async fn toggle_layout_cell(
        &self,
        id: &WarehouseId,
        row: u32,
        col: u32,
    ) -> Result<CellState, AppError> {
        let mut state = self.lock().await;
        let warehouse = state
            .warehouses
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| AppError::WarehouseNotFound(id.to_string()))?;

        let cell = warehouse
            .layout
            .get_or_insert_with(|| WarehouseLayout::new(1))
            .toggle(row, col);

        let Some(cell) = cell else {
            let mut err = ValidationError::new("range");
            err.message = Some("La celda está fuera de la cuadrícula.".into());
            let mut errors = ValidationErrors::new();
            errors.add("cell", err);
            return Err(AppError::ValidationError(errors));
        };

        self.persist(&state, Touched::WAREHOUSES).await;
        Ok(cell)
    }

    // =========================================================================
    //  3. ITENS
    // =========================================================================

    /// Insere (sem `id`) ou substitui (com `id`) um item.
    /// A classe de peso é sempre recalculada e a quantidade nunca fica abaixo de 1.
    pub async fn save_item(&self, payload: SaveItemPayload) -> Result<Item, AppError> {
        payload.validate()?;

        let mut state = self.lock().await;
        if let Some(warehouse_id) = &payload.warehouse_id {
            active_destination(&state, warehouse_id)?;
        }

        let quantity = payload.normalized_quantity();
        let existing = payload
            .id
            .as_ref()
            .and_then(|id| state.items.iter().position(|i| &i.id == id));

        let last_warehouse_name = match (&payload.warehouse_id, existing) {
            (None, Some(index)) => state.items[index].last_warehouse_name.clone(),
            _ => None,
        };

        let item = Item {
            id: payload.id.clone().unwrap_or_else(ItemId::generate),
            name: payload.name,
            category: payload.category,
            width: payload.width,
            height: payload.height,
            length: payload.length,
            unit_weight_kg: payload.unit_weight_kg,
            quantity,
            warehouse_id: payload.warehouse_id,
            weight_class: weight_class(payload.unit_weight_kg),
            last_warehouse_name,
        };

        match existing {
            Some(index) => state.items[index] = item.clone(),
            None => state.items.push(item.clone()),
        }

        self.persist(&state, Touched::ITEMS).await;
        Ok(item)
    }

    /// Remove o item. Idempotente: devolve `false` se ele já não existia.
    pub async fn delete_item(&self, id: &ItemId) -> bool {
        let mut state = self.lock().await;
        let before = state.items.len();
        state.items.retain(|i| &i.id != id);
        let removed = state.items.len() != before;
        if removed {
            self.persist(&state, Touched::ITEMS).await;
        }
        removed
    }

    /// Checagem feita antes de mover: quantidade e espaço livre no destino.
    pub async fn validate_move(&self, payload: &MoveItemPayload) -> Result<(), AppError> {
        let state = self.lock().await;
        let item = find_movable(&state, payload)?;
        check_quantity(payload.quantity, item.quantity)?;

        let destination = active_destination(&state, &payload.to_warehouse_id)?;

        let metrics = WarehouseMetrics::compute(destination, &state.items);
        let required = item.unit_volume() * f64::from(payload.quantity);
        if metrics.capacity > 0.0 && required > metrics.free {
            return Err(AppError::InsufficientCapacity {
                required,
                free: metrics.free,
            });
        }
        Ok(())
    }

    /// Move `quantity` unidades para outra bodega. Tudo: o item só troca de bodega.
    /// Parte: a origem diminui e o destino recebe (junta num item igual ou cria um novo).
    pub async fn move_item_partial(&self, payload: MoveItemPayload) -> Result<(), AppError> {
        let mut state = self.lock().await;

        let source = find_movable(&state, &payload)?.clone();
        check_quantity(payload.quantity, source.quantity)?;

        active_destination(&state, &payload.to_warehouse_id)?;
        if source.warehouse_id.as_ref() == Some(&payload.to_warehouse_id) {
            return Ok(());
        }

        let to = payload.to_warehouse_id;
        let source_index = state
            .items
            .iter()
            .position(|i| i.id == source.id)
            .ok_or_else(|| AppError::ItemNotFound(source.id.to_string()))?;

        if payload.quantity == source.quantity {
            let item = &mut state.items[source_index];
            item.warehouse_id = Some(to.clone());
            item.last_warehouse_name = None;
        } else {
            let target = state.items.iter().position(|i| {
                i.id != source.id && i.warehouse_id.as_ref() == Some(&to) && i.same_stock_as(&source)
            });
            match target {
                Some(index) => {
                    let merged = state.items[index]
                        .quantity
                        .checked_add(payload.quantity)
                        .ok_or_else(|| AppError::QuantityOverflow(state.items[index].id.to_string()))?;
                    state.items[source_index].quantity -= payload.quantity;
                    state.items[index].quantity = merged;
                }
                None => {
                    state.items[source_index].quantity -= payload.quantity;
                    state.items.push(Item {
                        id: ItemId::generate(),
                        quantity: payload.quantity,
                        warehouse_id: Some(to.clone()),
                        last_warehouse_name: None,
                        ..source.clone()
                    });
                }
            }
        }

        tracing::info!(
            "📦 {} un. de '{}' movidas para a bodega {}",
            payload.quantity,
            source.name,
            to
        );
        self.persist(&state, Touched::ITEMS).await;
        Ok(())
    }

    // =========================================================================
    //  4. SOLICITAÇÕES DE DESATIVAÇÃO
    // =========================================================================

    pub async fn create_deactivate_request(
        &self,
        mut payload: CreateDeactivationPayload,
    ) -> Result<DeactivationRequest, AppError> {
        payload.reason = payload.reason.trim().to_string();
        payload.validate()?;

        let mut state = self.lock().await;
        if !state.warehouses.iter().any(|w| w.id == payload.warehouse_id) {
            return Err(AppError::WarehouseNotFound(payload.warehouse_id.to_string()));
        }
        if state
            .requests
            .iter()
            .any(|r| r.is_pending() && r.warehouse_id == payload.warehouse_id)
        {
            return Err(AppError::DuplicatePendingRequest(payload.warehouse_id.to_string()));
        }

        let request = DeactivationRequest {
            id: Uuid::new_v4(),
            warehouse_id: payload.warehouse_id,
            user_id: payload.user_id,
            reason: payload.reason,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        state.requests.push(request.clone());
        self.persist(&state, Touched::REQUESTS).await;
        Ok(request)
    }

    /// Aprova: marca como aprovada e desliga a bodega (soltando os itens), tudo junto.
    pub async fn approve_request(&self, id: Uuid) -> Result<DeactivationRequest, AppError> {
        let mut state = self.lock().await;
        let request = resolve_locked(&mut state, id, RequestStatus::Approved)?;

        if !set_active_locked(&mut state, &request.warehouse_id, false) {
            tracing::warn!(
                "⚠️ Solicitação {} aprovada, mas a bodega {} não existe mais",
                id,
                request.warehouse_id
            );
        }
        self.persist(&state, Touched::ALL).await;
        Ok(request)
    }

    /// Rejeita: só muda o status, a bodega não é tocada.
    pub async fn reject_request(&self, id: Uuid) -> Result<DeactivationRequest, AppError> {
        let mut state = self.lock().await;
        let request = resolve_locked(&mut state, id, RequestStatus::Rejected)?;
        self.persist(&state, Touched::REQUESTS).await;
        Ok(request)
    }

    // =========================================================================
    //  5. LEITURAS
    // =========================================================================

    pub async fn warehouses(&self) -> Vec<Warehouse> {
        self.lock().await.warehouses.clone()
    }

    pub async fn warehouse(&self, id: &WarehouseId) -> Option<Warehouse> {
        self.lock().await.warehouses.iter().find(|w| &w.id == id).cloned()
    }

    pub async fn items(&self) -> Vec<Item> {
        self.lock().await.items.clone()
    }

    pub async fn item(&self, id: &ItemId) -> Option<Item> {
        self.lock().await.items.iter().find(|i| &i.id == id).cloned()
    }

    pub async fn items_in(&self, warehouse_id: &WarehouseId) -> Vec<Item> {
        self.lock()
            .await
            .items
            .iter()
            .filter(|i| i.warehouse_id.as_ref() == Some(warehouse_id))
            .cloned()
            .collect()
    }

    pub async fn orphan_items(&self) -> Vec<Item> {
        self.lock()
            .await
            .items
            .iter()
            .filter(|i| i.is_orphan())
            .cloned()
            .collect()
    }

    pub async fn requests(&self) -> Vec<DeactivationRequest> {
        self.lock().await.requests.clone()
    }

    pub async fn pending_requests(&self) -> Vec<DeactivationRequest> {
        self.lock()
            .await
            .requests
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }

    /// Métricas calculadas na hora, sobre a coleção de itens atual.
    pub async fn metrics_of(&self, id: &WarehouseId) -> Option<WarehouseMetrics> {
        let state = self.lock().await;
        state
            .warehouses
            .iter()
            .find(|w| &w.id == id)
            .map(|w| WarehouseMetrics::compute(w, &state.items))
    }

    pub async fn all_metrics(&self) -> Vec<(Warehouse, WarehouseMetrics)> {
        let state = self.lock().await;
        state
            .warehouses
            .iter()
            .map(|w| (w.clone(), WarehouseMetrics::compute(w, &state.items)))
            .collect()
    }
}

// ---
// Helpers (rodam com a guarda já adquirida)
// ---

// Layout e o toggle local de ativação sobrevivem à troca da lista vinda do servidor.
// Itens que apontam para uma bodega inativa são soltos na mesma passada.
fn replace_warehouses(state: &mut StoreState, mut remote: Vec<Warehouse>) -> Touched {
    for warehouse in remote.iter_mut() {
        let Some(previous) = state.warehouses.iter().find(|w| w.id == warehouse.id) else {
            continue;
        };
        if warehouse.layout.is_none() {
            warehouse.layout = previous.layout.clone();
        }
        if let Some(active) = previous.local_active {
            warehouse.local_active = Some(active);
            warehouse.active = active;
        }
    }
    state.warehouses = remote;

    let inactive: Vec<Warehouse> = state.warehouses.iter().filter(|w| !w.active).cloned().collect();
    let orphaned: usize = inactive
        .iter()
        .map(|w| orphan_items(&mut state.items, w))
        .sum();
    if orphaned > 0 {
        tracing::info!("🚫 {} itens soltos de bodegas inativas após a sincronização", orphaned);
        Touched::WAREHOUSES_AND_ITEMS
    } else {
        Touched::WAREHOUSES
    }
}

// Destino de item: tem que existir e estar ativo.
fn active_destination<'a>(state: &'a StoreState, id: &WarehouseId) -> Result<&'a Warehouse, AppError> {
    let warehouse = state
        .warehouses
        .iter()
        .find(|w| &w.id == id)
        .ok_or_else(|| AppError::WarehouseNotFound(id.to_string()))?;
    if !warehouse.active {
        return Err(AppError::WarehouseInactive(warehouse.name.clone()));
    }
    Ok(warehouse)
}

fn orphan_items(items: &mut [Item], warehouse: &Warehouse) -> usize {
    let mut count = 0;
    for item in items
        .iter_mut()
        .filter(|i| i.warehouse_id.as_ref() == Some(&warehouse.id))
    {
        item.detach(&warehouse.name);
        count += 1;
    }
    count
}

fn set_active_locked(state: &mut StoreState, id: &WarehouseId, active: bool) -> bool {
    let Some(index) = state.warehouses.iter().position(|w| &w.id == id) else {
        return false;
    };

    if !active {
        let warehouse = state.warehouses[index].clone();
        let orphaned = orphan_items(&mut state.items, &warehouse);
        tracing::info!(
            "🚫 Bodega '{}' desativada; {} itens ficaram soltos",
            warehouse.name,
            orphaned
        );
    }
    state.warehouses[index].active = active;
    state.warehouses[index].local_active = Some(active);
    true
}

fn resolve_locked(
    state: &mut StoreState,
    id: Uuid,
    status: RequestStatus,
) -> Result<DeactivationRequest, AppError> {
    let request = state
        .requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::RequestNotFound(id.to_string()))?;

    if !request.is_pending() {
        return Err(AppError::RequestAlreadyResolved);
    }
    request.status = status;
    request.resolved_at = Some(Utc::now());
    Ok(request.clone())
}

fn find_movable<'a>(state: &'a StoreState, payload: &MoveItemPayload) -> Result<&'a Item, AppError> {
    let item = state
        .items
        .iter()
        .find(|i| i.id == payload.id)
        .ok_or_else(|| AppError::ItemNotFound(payload.id.to_string()))?;

    // Se a origem foi informada, o item tem que estar lá
    if let Some(from) = &payload.from_warehouse_id {
        if item.warehouse_id.as_ref() != Some(from) {
            return Err(AppError::ItemNotFound(format!("{} en la bodega {}", payload.id, from)));
        }
    }
    Ok(item)
}

fn check_quantity(requested: u32, available: u32) -> Result<(), AppError> {
    if requested == 0 || requested > available {
        return Err(AppError::InvalidMoveQuantity { requested, available });
    }
    Ok(())
}
