use serde::{Deserialize, Serialize};

use warehouse_core::Entity;

/// Physical extent of a storage item (unit-agnostic).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }

    /// Whether `self` stands within the footprint of `outer`.
    ///
    /// Only width and depth are compared; height is not part of the footprint.
    pub fn fits_footprint_of(&self, outer: &Dimensions) -> bool {
        self.width <= outer.width && self.depth <= outer.depth
    }
}

/// Capability shared by everything the warehouse stores (boxes and pallets).
///
/// `volume` is always computed from current state, never cached.
pub trait StorageItem: Entity {
    fn dimensions(&self) -> Dimensions;

    fn weight(&self) -> f64;

    fn volume(&self) -> f64;
}
