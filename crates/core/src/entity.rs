//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities in logiflow (products, shipments) are mutated in place and carry
/// their own optimistic-concurrency version, bumped by the store on every save.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Version of the persisted row this value was loaded from.
    fn version(&self) -> u64;
}
