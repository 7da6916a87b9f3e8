//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities live inside an aggregate and are addressed by id; their position
/// in the owning collection is an implementation detail of the aggregate.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Index of the entity with `id` in `items`, if present.
pub fn position_of<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Seat(u8);

    impl Entity for Seat {
        type Id = u8;

        fn id(&self) -> &u8 {
            &self.0
        }
    }

    #[test]
    fn position_of_finds_first_match() {
        let seats = [Seat(4), Seat(7), Seat(9)];
        assert_eq!(position_of(&seats, &7), Some(1));
        assert_eq!(position_of(&seats, &1), None);
    }
}
