//! Core projection trait and position tracking.

use async_trait::async_trait;

use crate::Result;

/// Tracks how many snapshots a projection has applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of snapshots applied by this projection.
    pub snapshots_applied: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self {
            snapshots_applied: 0,
        }
    }

    /// Advances the position by one snapshot.
    pub fn advance(&self) -> Self {
        Self {
            snapshots_applied: self.snapshots_applied + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.snapshots_applied)
    }
}

/// A projection that rebuilds its read model from full snapshots.
///
/// Every snapshot is the complete current set, in no particular order.
/// Implementations replace their state wholesale and apply their own
/// ordering.
#[async_trait]
pub trait Projection<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Replaces the read model with `snapshot`.
    async fn replace(&self, snapshot: &[T]) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}
