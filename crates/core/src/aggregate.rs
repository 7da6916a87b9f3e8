//! Aggregate root trait and optimistic concurrency expectations.

use thiserror::Error;

/// Aggregate root marker + minimal interface.
///
/// An aggregate is the unit of consistency: everything it owns is loaded,
/// validated and persisted together.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Persistence revision of the aggregate's state.
    ///
    /// Starts at 1 on first insert and grows by one per committed write.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stored aggregate to be at an exact version.
    Exact(u64),
}

/// The stored revision did not match the writer's expectation.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("optimistic concurrency check failed (expected: {expected:?}, actual: {actual})")]
pub struct VersionMismatch {
    pub expected: ExpectedVersion,
    pub actual: u64,
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> Result<(), VersionMismatch> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(VersionMismatch {
                expected: self,
                actual,
            })
        }
    }

    /// The exact version expected, if any.
    pub fn exact(self) -> Option<u64> {
        match self {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_every_version() {
        assert!(ExpectedVersion::Any.check(0).is_ok());
        assert!(ExpectedVersion::Any.check(42).is_ok());
    }

    #[test]
    fn exact_reports_actual_on_mismatch() {
        let err = ExpectedVersion::Exact(3).check(4).unwrap_err();
        assert_eq!(err.actual, 4);
        assert_eq!(err.expected.exact(), Some(3));
    }
}
