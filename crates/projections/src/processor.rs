//! Projection processor for feeding snapshots to projections.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Result;
use crate::projection::Projection;

/// Delivers collection snapshots from a change feed to projections.
///
/// The processor supports:
/// - Single snapshot delivery to every registered projection
/// - Following a feed until its sender is dropped
/// - Rebuild: resets all projections and re-applies a snapshot
pub struct ProjectionProcessor<T: Send + Sync + 'static> {
    projections: Vec<Box<dyn Projection<T>>>,
}

impl<T: Send + Sync + 'static> Default for ProjectionProcessor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ProjectionProcessor<T> {
    pub fn new() -> Self {
        Self {
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection<T>>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers one snapshot to all registered projections.
    #[tracing::instrument(skip(self, snapshot), fields(size = snapshot.len()))]
    pub async fn process_snapshot(&self, snapshot: &[T]) -> Result<()> {
        for projection in &self.projections {
            projection.replace(snapshot).await?;
        }
        metrics::counter!("projections_snapshots_processed").increment(1);
        Ok(())
    }

    /// Resets all projections and applies `snapshot` from scratch.
    #[tracing::instrument(skip(self, snapshot))]
    pub async fn rebuild_all(&self, snapshot: &[T]) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.process_snapshot(snapshot).await
    }

    /// Applies the feed's current value, then every change after it.
    ///
    /// Returns once the sending side of the feed is dropped. Intermediate
    /// values may be skipped; only the latest snapshot is applied.
    pub async fn follow(&self, mut feed: watch::Receiver<Arc<Vec<T>>>) -> Result<()> {
        loop {
            let snapshot = Arc::clone(&feed.borrow_and_update());
            if let Err(e) = self.process_snapshot(&snapshot).await {
                tracing::warn!(error = %e, "Projection failed to apply snapshot");
            }

            if feed.changed().await.is_err() {
                tracing::info!("Change feed closed");
                return Ok(());
            }
        }
    }

    /// Spawns [`follow`](Self::follow) onto the runtime.
    pub fn spawn(self, feed: watch::Receiver<Arc<Vec<T>>>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.follow(feed).await })
    }
}
