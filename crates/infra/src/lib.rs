//! Infrastructure layer: persistence of pallets and boxes.

pub mod store;

pub use store::{
    InMemoryWarehouseStore, PostgresWarehouseStore, StoreError, StoreResult, WarehouseStore,
};
