use chrono::{DateTime, Utc};

use warehouse_core::{BoxId, DomainError, DomainResult, Entity, PalletId};

use crate::item::{Dimensions, StorageItem};
use crate::storage_box::StorageBox;

/// Tare weight of an empty pallet.
pub const PALLET_BASE_WEIGHT: f64 = 30.0;

/// Aggregate root: a pallet and the boxes placed on it.
///
/// `weight` and `expiration_date` are derived from `boxes` and recomputed in
/// full after every mutation; there is no way to set them directly.
///
/// Invariants, holding after every public operation:
/// - `weight == PALLET_BASE_WEIGHT + sum(box.weight)`
/// - `expiration_date == min(box.expiration_date)` over boxes that have one
/// - every box fits the pallet footprint (width and depth)
#[derive(Debug, Clone, PartialEq)]
pub struct Pallet {
    id: PalletId,
    dimensions: Dimensions,
    boxes: Vec<StorageBox>,
    weight: f64,
    expiration_date: Option<DateTime<Utc>>,
}

impl Pallet {
    pub fn new(id: PalletId, width: f64, height: f64, depth: f64) -> Self {
        Self {
            id,
            dimensions: Dimensions::new(width, height, depth),
            boxes: Vec::new(),
            weight: PALLET_BASE_WEIGHT,
            expiration_date: None,
        }
    }

    /// Rebuild a pallet from stored parts.
    ///
    /// Boxes go through the same placement check as [`Pallet::add_box`], must
    /// reference this pallet and appear once. Derived fields are recomputed,
    /// never read back.
    pub fn from_parts(
        id: PalletId,
        dimensions: Dimensions,
        boxes: Vec<StorageBox>,
    ) -> DomainResult<Self> {
        let mut pallet = Self::new(id, dimensions.width, dimensions.height, dimensions.depth);

        for item in boxes {
            if item.pallet_id() != id {
                return Err(DomainError::validation(format!(
                    "box {} belongs to pallet {}, not {}",
                    item.id(),
                    item.pallet_id(),
                    id
                )));
            }
            if pallet.contains_box(item.id()) {
                return Err(DomainError::validation(format!(
                    "box {} listed twice on pallet {}",
                    item.id(),
                    id
                )));
            }
            pallet.ensure_fits(&item)?;
            pallet.boxes.push(item);
        }

        pallet.recalculate();
        Ok(pallet)
    }

    /// Place a box on the pallet.
    ///
    /// Fails with [`DomainError::InvalidPlacement`] when the box is wider or
    /// deeper than the pallet; the pallet is left untouched in that case.
    /// Height is not checked.
    pub fn add_box(&mut self, item: StorageBox) -> DomainResult<()> {
        self.ensure_fits(&item)?;
        self.boxes.push(item);
        self.recalculate();
        Ok(())
    }

    /// Take a box off the pallet, recomputing derived fields from what remains.
    ///
    /// Returns `None` (and changes nothing) when the box is not on this pallet.
    pub fn remove_box(&mut self, box_id: BoxId) -> Option<StorageBox> {
        let index = self.boxes.iter().position(|b| b.id() == box_id)?;
        let removed = self.boxes.remove(index);
        self.recalculate();
        Some(removed)
    }

    pub fn boxes(&self) -> &[StorageBox] {
        &self.boxes
    }

    pub fn contains_box(&self, box_id: BoxId) -> bool {
        self.boxes.iter().any(|b| b.id() == box_id)
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    /// Latest expiration date among the boxes, if any box has one.
    pub fn latest_box_expiration(&self) -> Option<DateTime<Utc>> {
        self.boxes.iter().filter_map(StorageBox::expiration_date).max()
    }

    fn ensure_fits(&self, item: &StorageBox) -> DomainResult<()> {
        let outer = self.dimensions;
        let inner = item.dimensions();
        if inner.fits_footprint_of(&outer) {
            return Ok(());
        }
        Err(DomainError::invalid_placement(format!(
            "box {} ({} x {}) exceeds pallet {} footprint ({} x {})",
            item.id(),
            inner.width,
            inner.depth,
            self.id,
            outer.width,
            outer.depth
        )))
    }

    fn recalculate(&mut self) {
        self.weight = PALLET_BASE_WEIGHT + self.boxes.iter().map(StorageBox::weight).sum::<f64>();
        self.expiration_date = self.boxes.iter().filter_map(StorageBox::expiration_date).min();
    }
}

impl Entity for Pallet {
    type Id = PalletId;

    fn id(&self) -> PalletId {
        self.id
    }
}

impl StorageItem for Pallet {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    /// Own volume plus the volume of every box, whether or not the boxes
    /// would geometrically fit inside the pallet's own extent.
    fn volume(&self) -> f64 {
        let boxes: f64 = self.boxes.iter().map(StorageBox::volume).sum();
        boxes + self.dimensions.volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn test_pallet() -> Pallet {
        Pallet::new(PalletId::new(), 3.0, 2.0, 2.0)
    }

    fn box_on(
        pallet: &Pallet,
        (width, height, depth): (f64, f64, f64),
        weight: f64,
        manufactured: Option<DateTime<Utc>>,
        expires: Option<DateTime<Utc>>,
    ) -> StorageBox {
        StorageBox::new(
            BoxId::new(),
            width,
            height,
            depth,
            weight,
            pallet.id(),
            manufactured,
            expires,
        )
    }

    #[test]
    fn new_pallet_has_base_weight_and_no_expiration() {
        let pallet = test_pallet();
        assert_eq!(pallet.weight(), PALLET_BASE_WEIGHT);
        assert_eq!(pallet.expiration_date(), None);
        assert!(pallet.boxes().is_empty());
        assert_eq!(pallet.volume(), 12.0);
    }

    #[test]
    fn wider_box_is_rejected_without_mutation() {
        let mut pallet = test_pallet();
        let before = pallet.clone();
        let large = box_on(&pallet, (4.0, 1.0, 1.0), 5.0, None, None);

        let err = pallet.add_box(large).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPlacement(_)));
        assert_eq!(pallet, before);
    }

    #[test]
    fn deeper_box_is_rejected() {
        let mut pallet = test_pallet();
        let deep = box_on(&pallet, (1.0, 1.0, 2.5), 5.0, None, None);
        assert!(matches!(
            pallet.add_box(deep),
            Err(DomainError::InvalidPlacement(_))
        ));
        assert!(pallet.boxes().is_empty());
    }

    #[test]
    fn taller_box_is_accepted() {
        let mut pallet = test_pallet();
        let tall = box_on(&pallet, (3.0, 10.0, 2.0), 1.0, None, None);
        pallet.add_box(tall).unwrap();
        assert_eq!(pallet.boxes().len(), 1);
    }

    #[test]
    fn expiration_is_earliest_box_expiration() {
        let mut pallet = test_pallet();
        let derived = box_on(&pallet, (2.0, 1.0, 1.0), 5.0, Some(date(2023, 1, 1)), None);
        let explicit = box_on(&pallet, (1.0, 1.0, 1.0), 3.0, None, Some(date(2023, 4, 1)));

        pallet.add_box(derived).unwrap();
        assert_eq!(pallet.expiration_date(), Some(date(2023, 4, 11)));

        pallet.add_box(explicit).unwrap();
        assert_eq!(pallet.expiration_date(), Some(date(2023, 4, 1)));
        assert_eq!(pallet.latest_box_expiration(), Some(date(2023, 4, 11)));
    }

    #[test]
    fn undated_boxes_do_not_affect_expiration() {
        let mut pallet = test_pallet();
        pallet
            .add_box(box_on(&pallet, (1.0, 1.0, 1.0), 1.0, None, None))
            .unwrap();
        assert_eq!(pallet.expiration_date(), None);

        pallet
            .add_box(box_on(&pallet, (1.0, 1.0, 1.0), 1.0, None, Some(date(2024, 6, 1))))
            .unwrap();
        assert_eq!(pallet.expiration_date(), Some(date(2024, 6, 1)));
    }

    #[test]
    fn weight_accumulates_box_weights() {
        let mut pallet = test_pallet();
        pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 5.0, None, None)).unwrap();
        pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 3.0, None, None)).unwrap();
        assert_eq!(pallet.weight(), 38.0);

        pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 2.5, None, None)).unwrap();
        assert_eq!(pallet.weight(), 40.5);
    }

    #[test]
    fn volume_adds_boxes_to_own_volume() {
        let mut pallet = test_pallet();
        pallet.add_box(box_on(&pallet, (2.0, 1.0, 1.0), 5.0, None, None)).unwrap();
        pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 3.0, None, None)).unwrap();
        assert_eq!(pallet.volume(), 15.0);
    }

    #[test]
    fn remove_box_recomputes_from_remaining_boxes() {
        let mut pallet = test_pallet();
        let early = box_on(&pallet, (1.0, 1.0, 1.0), 5.0, None, Some(date(2023, 3, 1)));
        let late = box_on(&pallet, (1.0, 1.0, 1.0), 3.0, None, Some(date(2023, 9, 1)));
        let early_id = early.id();
        pallet.add_box(early).unwrap();
        pallet.add_box(late).unwrap();

        let removed = pallet.remove_box(early_id).unwrap();
        assert_eq!(removed.id(), early_id);
        assert_eq!(pallet.weight(), 33.0);
        assert_eq!(pallet.expiration_date(), Some(date(2023, 9, 1)));
        assert!(!pallet.contains_box(early_id));
    }

    #[test]
    fn removing_unknown_box_changes_nothing() {
        let mut pallet = test_pallet();
        pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 5.0, None, None)).unwrap();
        let before = pallet.clone();
        assert!(pallet.remove_box(BoxId::new()).is_none());
        assert_eq!(pallet, before);
    }

    #[test]
    fn from_parts_recomputes_derived_fields() {
        let id = PalletId::new();
        let shell = Pallet::new(id, 3.0, 2.0, 2.0);
        let boxes = vec![
            box_on(&shell, (2.0, 1.0, 1.0), 5.0, None, Some(date(2023, 5, 1))),
            box_on(&shell, (1.0, 1.0, 1.0), 3.0, None, Some(date(2023, 4, 1))),
        ];

        let pallet = Pallet::from_parts(id, Dimensions::new(3.0, 2.0, 2.0), boxes).unwrap();
        assert_eq!(pallet.weight(), 38.0);
        assert_eq!(pallet.expiration_date(), Some(date(2023, 4, 1)));
        assert_eq!(pallet.volume(), 15.0);
    }

    #[test]
    fn from_parts_rejects_foreign_or_oversized_boxes() {
        let id = PalletId::new();
        let dims = Dimensions::new(3.0, 2.0, 2.0);
        let other = Pallet::new(PalletId::new(), 3.0, 2.0, 2.0);
        let foreign = vec![box_on(&other, (1.0, 1.0, 1.0), 1.0, None, None)];
        assert!(matches!(
            Pallet::from_parts(id, dims, foreign),
            Err(DomainError::Validation(_))
        ));

        let shell = Pallet::new(id, 3.0, 2.0, 2.0);
        let oversized = vec![box_on(&shell, (5.0, 1.0, 1.0), 1.0, None, None)];
        assert!(matches!(
            Pallet::from_parts(id, dims, oversized),
            Err(DomainError::InvalidPlacement(_))
        ));
    }

    #[test]
    fn from_parts_rejects_duplicate_boxes() {
        let id = PalletId::new();
        let shell = Pallet::new(id, 3.0, 2.0, 2.0);
        let item = box_on(&shell, (1.0, 1.0, 1.0), 1.0, None, None);

        let err = Pallet::from_parts(id, shell.dimensions(), vec![item.clone(), item]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    fn dated_box() -> impl Strategy<Value = (f64, Option<i64>)> {
        (0.0f64..1_000.0, proptest::option::of(0i64..3_650))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: weight and expiration always match the box collection.
        #[test]
        fn derived_fields_track_box_collection(
            specs in prop::collection::vec(dated_box(), 0..20)
        ) {
            let base = date(2023, 1, 1);
            let mut pallet = test_pallet();
            let mut expected_weight = PALLET_BASE_WEIGHT;
            let mut expected_expiration: Option<DateTime<Utc>> = None;

            for (weight, offset) in specs {
                let expires = offset.map(|days| base + chrono::Duration::days(days));
                let item = box_on(&pallet, (1.0, 1.0, 1.0), weight, None, expires);
                pallet.add_box(item).unwrap();

                expected_weight += weight;
                expected_expiration = match (expected_expiration, expires) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };

                prop_assert!((pallet.weight() - expected_weight).abs() < 1e-6);
                prop_assert_eq!(pallet.expiration_date(), expected_expiration);
            }
        }

        /// Property: insertion order does not change the derived fields.
        #[test]
        fn aggregation_is_order_independent(
            specs in prop::collection::vec(dated_box(), 1..12)
        ) {
            let base = date(2023, 1, 1);
            let id = PalletId::new();
            let shell = Pallet::new(id, 3.0, 2.0, 2.0);
            let boxes: Vec<StorageBox> = specs
                .iter()
                .map(|(weight, offset)| {
                    let expires = offset.map(|days| base + chrono::Duration::days(days));
                    box_on(&shell, (1.0, 1.0, 1.0), *weight, None, expires)
                })
                .collect();

            let mut forward = shell.clone();
            for item in boxes.iter().cloned() {
                forward.add_box(item).unwrap();
            }
            let mut backward = shell.clone();
            for item in boxes.iter().rev().cloned() {
                backward.add_box(item).unwrap();
            }

            prop_assert_eq!(forward.expiration_date(), backward.expiration_date());
            prop_assert!((forward.weight() - backward.weight()).abs() < 1e-6);
        }

        /// Property: a rejected placement never mutates the pallet.
        #[test]
        fn rejected_placement_is_atomic(
            width in 3.001f64..100.0,
            weight in 0.0f64..100.0,
        ) {
            let mut pallet = test_pallet();
            pallet.add_box(box_on(&pallet, (1.0, 1.0, 1.0), 4.0, None, None)).unwrap();
            let before = pallet.clone();

            let oversized = box_on(&pallet, (width, 1.0, 1.0), weight, None, None);
            prop_assert!(pallet.add_box(oversized).is_err());
            prop_assert_eq!(pallet, before);
        }
    }
}
