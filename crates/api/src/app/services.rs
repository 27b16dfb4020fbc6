use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use warehouse_core::{BoxId, DomainError, Entity, PalletId};
use warehouse_infra::{
    InMemoryWarehouseStore, PostgresWarehouseStore, StoreError, WarehouseStore,
};
use warehouse_inventory::{
    ExpirationGroup, Pallet, StorageBox, StorageItem, TOP_PALLETS_LIMIT, group_by_expiration,
    top_pallets,
};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Attributes of a box about to be placed; ids are assigned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub weight: f64,
    pub manufacture_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Snapshot of every pallet, with the overview views computed on top.
#[derive(Debug, Clone)]
pub struct Overview {
    pub pallets: Vec<Pallet>,
}

impl Overview {
    pub fn expiration_groups(&self) -> Vec<ExpirationGroup<'_>> {
        group_by_expiration(&self.pallets)
    }

    pub fn top_pallets(&self) -> Vec<&Pallet> {
        top_pallets(&self.pallets, TOP_PALLETS_LIMIT)
    }
}

/// Application service: loads pallets, runs the domain operation, persists.
///
/// Mutations run one at a time (`writes`), so a load-modify-store sequence on
/// a pallet never interleaves with another one.
pub struct WarehouseService {
    store: Arc<dyn WarehouseStore>,
    writes: Mutex<()>,
}

impl WarehouseService {
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    pub async fn overview(&self) -> ServiceResult<Overview> {
        let pallets = self.store.list_pallets().await?;
        Ok(Overview { pallets })
    }

    pub async fn list_pallets(&self) -> ServiceResult<Vec<Pallet>> {
        Ok(self.store.list_pallets().await?)
    }

    pub async fn get_pallet(&self, id: PalletId) -> ServiceResult<Pallet> {
        self.store
            .get_pallet(id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    pub async fn create_pallet(&self, width: f64, height: f64, depth: f64) -> ServiceResult<Pallet> {
        let _guard = self.writes.lock().await;

        let pallet = Pallet::new(PalletId::new(), width, height, depth);
        self.store.insert_pallet(&pallet).await?;

        tracing::info!(pallet_id = %pallet.id(), width, height, depth, "pallet created");
        Ok(pallet)
    }

    pub async fn delete_pallet(&self, id: PalletId) -> ServiceResult<()> {
        let _guard = self.writes.lock().await;

        if !self.store.delete_pallet(id).await? {
            return Err(DomainError::not_found().into());
        }
        tracing::info!(pallet_id = %id, "pallet deleted with its boxes");
        Ok(())
    }

    /// Place a new box on pallet `pallet_id` and persist the result.
    ///
    /// Returns the updated pallet. An invalid placement leaves storage untouched.
    pub async fn create_box(&self, pallet_id: PalletId, input: NewBox) -> ServiceResult<Pallet> {
        let _guard = self.writes.lock().await;

        let mut pallet = self
            .store
            .get_pallet(pallet_id)
            .await?
            .ok_or_else(DomainError::not_found)?;

        let item = StorageBox::new(
            BoxId::new(),
            input.width,
            input.height,
            input.depth,
            input.weight,
            pallet_id,
            input.manufacture_date,
            input.expiration_date,
        );
        let box_id = item.id();

        if let Err(e) = pallet.add_box(item.clone()) {
            tracing::warn!(pallet_id = %pallet_id, box_id = %box_id, "box rejected: {e}");
            return Err(e.into());
        }
        self.store.save_box(&pallet, &item).await?;

        tracing::info!(
            pallet_id = %pallet_id,
            box_id = %box_id,
            pallet_weight = pallet.weight(),
            "box placed"
        );
        Ok(pallet)
    }

    /// Remove a box from whichever pallet holds it, recomputing that pallet.
    pub async fn delete_box(&self, box_id: BoxId) -> ServiceResult<Pallet> {
        let _guard = self.writes.lock().await;

        let pallet_id = self
            .store
            .find_box_pallet(box_id)
            .await?
            .ok_or_else(DomainError::not_found)?;
        let mut pallet = self
            .store
            .get_pallet(pallet_id)
            .await?
            .ok_or_else(DomainError::not_found)?;

        if pallet.remove_box(box_id).is_none() {
            return Err(DomainError::not_found().into());
        }
        self.store.delete_box(&pallet, box_id).await?;

        tracing::info!(pallet_id = %pallet_id, box_id = %box_id, "box removed");
        Ok(pallet)
    }
}

/// Wire the service against the store selected by `config`.
pub async fn build_services(config: &Config) -> anyhow::Result<WarehouseService> {
    let store: Arc<dyn WarehouseStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresWarehouseStore::connect(url, config.db_max_connections).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            Arc::new(InMemoryWarehouseStore::new())
        }
    };
    Ok(WarehouseService::new(store))
}
