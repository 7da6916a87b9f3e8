//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attributes. Constructors
/// are expected to validate, so holding a value object proves its invariants
/// (e.g. a customer name that already has a first and last name).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
