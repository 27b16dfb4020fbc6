//! Pallet/box persistence boundary.
//!
//! The store only persists what the domain model computed. Derived pallet
//! fields are written for querying but recomputed on every load.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryWarehouseStore;
pub use postgres::PostgresWarehouseStore;
pub use r#trait::{StoreError, StoreResult, WarehouseStore};
