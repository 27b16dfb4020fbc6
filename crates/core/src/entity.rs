//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Both storage items (boxes and pallets) are entities: a pallet whose boxes
/// change is still the same pallet.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
