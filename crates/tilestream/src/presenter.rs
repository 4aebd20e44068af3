//! # Presenter Bridge
//!
//! Consumer-side application of drained requests. The [`Presenter`] is the
//! external collaborator that owns visible objects (scene nodes, GPU
//! instances, whatever the host uses). The bridge maps the solver's keys to
//! the presenter's handles and applies a batch in dependency order:
//!
//! 1. cluster creates
//! 2. tile creates (parented to their cluster handle)
//! 3. tile destroys
//! 4. cluster destroys

use std::collections::HashMap;

use tilestream_wfc::{ClusterKey, TileKey, TileRequest};

use crate::requests::RequestBatch;

/// Host-side materialization.
pub trait Presenter {
    /// Handle of a materialized cluster (container node).
    type ClusterHandle;
    /// Handle of a materialized tile.
    type TileHandle;

    /// Creates the container for a new cluster.
    fn create_cluster(&mut self, key: ClusterKey) -> Self::ClusterHandle;

    /// Releases a cluster container. Its tiles have already been released.
    fn destroy_cluster(&mut self, handle: Self::ClusterHandle);

    /// Instantiates a tile under `cluster`.
    fn create_tile(&mut self, request: &TileRequest, cluster: &Self::ClusterHandle)
        -> Self::TileHandle;

    /// Releases a tile.
    fn destroy_tile(&mut self, handle: Self::TileHandle);

    /// Log line from the generator.
    fn log(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

/// What one [`PresenterBridge::apply`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Clusters created.
    pub clusters_created: usize,
    /// Tiles created.
    pub tiles_created: usize,
    /// Tiles destroyed.
    pub tiles_destroyed: usize,
    /// Clusters destroyed.
    pub clusters_destroyed: usize,
    /// Requests naming a key the bridge does not know (skipped).
    pub orphaned: usize,
    /// Log lines forwarded.
    pub logs: usize,
}

impl ApplyReport {
    /// Whether anything visible changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.clusters_created + self.tiles_created + self.tiles_destroyed + self.clusters_destroyed
            > 0
    }
}

/// Key-to-handle bookkeeping around a [`Presenter`].
pub struct PresenterBridge<P: Presenter> {
    presenter: P,
    clusters: HashMap<ClusterKey, P::ClusterHandle>,
    tiles: HashMap<TileKey, P::TileHandle>,
}

impl<P: Presenter> std::fmt::Debug for PresenterBridge<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenterBridge")
            .field("clusters", &self.clusters.len())
            .field("tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}

impl<P: Presenter> PresenterBridge<P> {
    /// Wraps a presenter with empty handle maps.
    #[must_use]
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            clusters: HashMap::new(),
            tiles: HashMap::new(),
        }
    }

    /// The wrapped presenter.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The wrapped presenter, mutably.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Unwraps the presenter, dropping the handle maps.
    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Live cluster handles.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Live tile handles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Handle of a live cluster.
    #[must_use]
    pub fn cluster_handle(&self, key: ClusterKey) -> Option<&P::ClusterHandle> {
        self.clusters.get(&key)
    }

    /// Handle of a live tile.
    #[must_use]
    pub fn tile_handle(&self, key: TileKey) -> Option<&P::TileHandle> {
        self.tiles.get(&key)
    }

    /// Applies one drained batch.
    pub fn apply(&mut self, batch: RequestBatch) -> ApplyReport {
        let mut report = ApplyReport::default();

        for key in batch.cluster_creates {
            let handle = self.presenter.create_cluster(key);
            if let Some(stale) = self.clusters.insert(key, handle) {
                self.presenter.destroy_cluster(stale);
            }
            report.clusters_created += 1;
        }

        for request in batch.tile_creates {
            let Some(cluster) = self.clusters.get(&request.cluster) else {
                // the cluster was evicted before we got here
                tracing::debug!("Dropping tile {:?}: cluster {:?} gone", request.key, request.cluster);
                report.orphaned += 1;
                continue;
            };
            let handle = self.presenter.create_tile(&request, cluster);
            if let Some(stale) = self.tiles.insert(request.key, handle) {
                self.presenter.destroy_tile(stale);
            }
            report.tiles_created += 1;
        }

        for key in batch.tile_destroys {
            match self.tiles.remove(&key) {
                Some(handle) => {
                    self.presenter.destroy_tile(handle);
                    report.tiles_destroyed += 1;
                }
                None => report.orphaned += 1,
            }
        }

        for key in batch.cluster_destroys {
            match self.clusters.remove(&key) {
                Some(handle) => {
                    self.presenter.destroy_cluster(handle);
                    report.clusters_destroyed += 1;
                }
                None => report.orphaned += 1,
            }
        }

        for message in &batch.logs {
            self.presenter.log(message);
        }
        report.logs = batch.logs.len();

        report
    }
}
