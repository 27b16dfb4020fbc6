use chrono::{DateTime, Duration, Utc};

use warehouse_core::{BoxId, Entity, PalletId};

use crate::item::{Dimensions, StorageItem};

/// Days between manufacture and expiration when no expiration date is given.
pub const SHELF_LIFE_DAYS: i64 = 100;

/// A box placed (or about to be placed) on a pallet.
///
/// `pallet_id` is a lookup key only; the owning [`crate::Pallet`] holds the box
/// itself. No numeric validation happens here, that belongs to the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageBox {
    id: BoxId,
    pallet_id: PalletId,
    dimensions: Dimensions,
    weight: f64,
    manufacture_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
}

impl StorageBox {
    /// Build a box. When only the manufacture date is known the expiration date
    /// is derived from it; an explicit expiration date is kept verbatim.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BoxId,
        width: f64,
        height: f64,
        depth: f64,
        weight: f64,
        pallet_id: PalletId,
        manufacture_date: Option<DateTime<Utc>>,
        expiration_date: Option<DateTime<Utc>>,
    ) -> Self {
        let mut item = Self {
            id,
            pallet_id,
            dimensions: Dimensions::new(width, height, depth),
            weight,
            manufacture_date,
            expiration_date,
        };

        if item.manufacture_date.is_some() && item.expiration_date.is_none() {
            item.calculate_expiration_date();
        }

        item
    }

    /// Set `expiration_date = manufacture_date + SHELF_LIFE_DAYS`.
    ///
    /// No-op without a manufacture date. A sum past chrono's representable
    /// range leaves the expiration date unset.
    pub fn calculate_expiration_date(&mut self) {
        if let Some(manufactured) = self.manufacture_date {
            self.expiration_date =
                manufactured.checked_add_signed(Duration::days(SHELF_LIFE_DAYS));
        }
    }

    pub fn pallet_id(&self) -> PalletId {
        self.pallet_id
    }

    pub fn manufacture_date(&self) -> Option<DateTime<Utc>> {
        self.manufacture_date
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn set_manufacture_date(&mut self, date: Option<DateTime<Utc>>) {
        self.manufacture_date = date;
    }

    pub fn set_expiration_date(&mut self, date: Option<DateTime<Utc>>) {
        self.expiration_date = date;
    }
}

impl Entity for StorageBox {
    type Id = BoxId;

    fn id(&self) -> BoxId {
        self.id
    }
}

impl StorageItem for StorageBox {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn volume(&self) -> f64 {
        self.dimensions.volume()
    }
}
