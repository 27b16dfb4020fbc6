use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use warehouse_core::{BoxId, Entity, PalletId};
use warehouse_inventory::{Pallet, StorageBox};

use super::r#trait::{StoreError, StoreResult, WarehouseStore};

#[derive(Debug, Default)]
struct Inner {
    /// Insertion order doubles as listing order.
    pallets: Vec<Pallet>,
    box_owners: HashMap<BoxId, PalletId>,
}

impl Inner {
    fn position(&self, id: PalletId) -> Option<usize> {
        self.pallets.iter().position(|p| p.id() == id)
    }

    fn replace(&mut self, pallet: &Pallet) -> StoreResult<()> {
        let index = self
            .position(pallet.id())
            .ok_or_else(|| StoreError::Missing(format!("pallet {}", pallet.id())))?;
        self.pallets[index] = pallet.clone();
        Ok(())
    }
}

/// In-memory pallet store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    inner: RwLock<Inner>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn insert_pallet(&self, pallet: &Pallet) -> StoreResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.position(pallet.id()).is_some() {
            return Err(StoreError::Database(format!(
                "pallet {} already exists",
                pallet.id()
            )));
        }
        for item in pallet.boxes() {
            inner.box_owners.insert(item.id(), pallet.id());
        }
        inner.pallets.push(pallet.clone());
        Ok(())
    }

    async fn get_pallet(&self, id: PalletId) -> StoreResult<Option<Pallet>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.pallets.iter().find(|p| p.id() == id).cloned())
    }

    async fn list_pallets(&self) -> StoreResult<Vec<Pallet>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.pallets.clone())
    }

    async fn delete_pallet(&self, id: PalletId) -> StoreResult<bool> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let Some(index) = inner.position(id) else {
            return Ok(false);
        };
        inner.pallets.remove(index);
        inner.box_owners.retain(|_box_id, owner| *owner != id);
        Ok(true)
    }

    async fn save_box(&self, pallet: &Pallet, item: &StorageBox) -> StoreResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.box_owners.contains_key(&item.id()) {
            return Err(StoreError::Database(format!("box {} already exists", item.id())));
        }
        inner.replace(pallet)?;
        inner.box_owners.insert(item.id(), pallet.id());
        Ok(())
    }

    async fn find_box_pallet(&self, id: BoxId) -> StoreResult<Option<PalletId>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.box_owners.get(&id).copied())
    }

    async fn delete_box(&self, pallet: &Pallet, id: BoxId) -> StoreResult<()> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.replace(pallet)?;
        inner.box_owners.remove(&id);
        Ok(())
    }
}
