use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use warehouse_core::{BoxId, DomainError, PalletId};
use warehouse_inventory::{Pallet, StorageBox};

/// Result type used by store implementations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),

    /// A row referenced by the write does not exist (e.g. a box for an unknown pallet).
    #[error("missing record: {0}")]
    Missing(String),

    /// Stored data cannot be turned back into a valid domain object.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The store cannot be used right now (poisoned lock, closed pool).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Persistence of pallets together with their boxes.
///
/// Writes that touch a box also write the owning pallet's derived columns in
/// the same unit of work. Cascading a pallet delete to its boxes is the
/// store's job.
///
/// Callers serialize mutations per pallet; implementations do not detect lost
/// updates.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Persist a freshly created (empty) pallet.
    async fn insert_pallet(&self, pallet: &Pallet) -> StoreResult<()>;

    /// Load a pallet with its boxes in placement order.
    async fn get_pallet(&self, id: PalletId) -> StoreResult<Option<Pallet>>;

    /// Load every pallet with its boxes, oldest first.
    async fn list_pallets(&self) -> StoreResult<Vec<Pallet>>;

    /// Delete a pallet and all of its boxes. Returns whether it existed.
    async fn delete_pallet(&self, id: PalletId) -> StoreResult<bool>;

    /// Persist `item`, which has just been placed on `pallet`, and the
    /// pallet's recomputed weight and expiration date.
    async fn save_box(&self, pallet: &Pallet, item: &StorageBox) -> StoreResult<()>;

    /// Which pallet a box is stored on.
    async fn find_box_pallet(&self, id: BoxId) -> StoreResult<Option<PalletId>>;

    /// Delete box `id`, which has just been removed from `pallet`, and persist
    /// the pallet's recomputed weight and expiration date.
    async fn delete_box(&self, pallet: &Pallet, id: BoxId) -> StoreResult<()>;
}

#[async_trait]
impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    async fn insert_pallet(&self, pallet: &Pallet) -> StoreResult<()> {
        (**self).insert_pallet(pallet).await
    }

    async fn get_pallet(&self, id: PalletId) -> StoreResult<Option<Pallet>> {
        (**self).get_pallet(id).await
    }

    async fn list_pallets(&self) -> StoreResult<Vec<Pallet>> {
        (**self).list_pallets().await
    }

    async fn delete_pallet(&self, id: PalletId) -> StoreResult<bool> {
        (**self).delete_pallet(id).await
    }

    async fn save_box(&self, pallet: &Pallet, item: &StorageBox) -> StoreResult<()> {
        (**self).save_box(pallet, item).await
    }

    async fn find_box_pallet(&self, id: BoxId) -> StoreResult<Option<PalletId>> {
        (**self).find_box_pallet(id).await
    }

    async fn delete_box(&self, pallet: &Pallet, id: BoxId) -> StoreResult<()> {
        (**self).delete_box(pallet, id).await
    }
}
