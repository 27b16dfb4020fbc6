//! Warehouse inventory domain module.
//!
//! Pallets holding boxes, with volume, weight and expiration-date rules,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod pallet;
pub mod report;
pub mod storage_box;

pub use item::{Dimensions, StorageItem};
pub use pallet::{PALLET_BASE_WEIGHT, Pallet};
pub use report::{ExpirationGroup, TOP_PALLETS_LIMIT, group_by_expiration, top_pallets};
pub use storage_box::{SHELF_LIFE_DAYS, StorageBox};
