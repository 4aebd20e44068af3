//! # Request Channels
//!
//! The only data crossing from the generating thread to the consumer:
//!
//! ```text
//!   Tilemap ──sink──> RequestQueues ══╦═ cluster create ═╗
//!   (worker)                          ╠═ tile create    ═╣
//!                                     ╠═ tile destroy   ═╬══> RequestReceivers::drain ──> RequestBatch
//!                                     ╠═ cluster destroy═╣        (consumer)
//!                                     ╚═ log            ═╝
//! ```
//!
//! One unbounded channel per request kind. Requests move through by value;
//! the consumer drains everything pending into an owned [`RequestBatch`] and
//! processes it with no lock or channel held.
//!
//! The worker always sends a cluster's create before any of its tile
//! creates, and a tile's create before its destroy. Draining the channels in
//! the reverse of that order (destroys first, cluster creates last)
//! guarantees a batch never holds a request whose prerequisite is still
//! sitting in a channel.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tilestream_wfc::{ClusterKey, MaterializationSink, TileKey, TileRequest};

/// Creates a connected queue/receiver pair.
#[must_use]
pub fn request_channels() -> (RequestQueues, RequestReceivers) {
    let (cluster_create_tx, cluster_create_rx) = unbounded();
    let (cluster_destroy_tx, cluster_destroy_rx) = unbounded();
    let (tile_create_tx, tile_create_rx) = unbounded();
    let (tile_destroy_tx, tile_destroy_rx) = unbounded();
    let (log_tx, log_rx) = unbounded();

    (
        RequestQueues {
            cluster_create: cluster_create_tx,
            cluster_destroy: cluster_destroy_tx,
            tile_create: tile_create_tx,
            tile_destroy: tile_destroy_tx,
            log: log_tx,
        },
        RequestReceivers {
            cluster_create: cluster_create_rx,
            cluster_destroy: cluster_destroy_rx,
            tile_create: tile_create_rx,
            tile_destroy: tile_destroy_rx,
            log: log_rx,
        },
    )
}

/// Producer side. Installed as the tilemap's materialization sink.
///
/// Sends never block. Requests sent after the receivers are dropped are
/// discarded: nobody is left to present them.
#[derive(Clone, Debug)]
pub struct RequestQueues {
    cluster_create: Sender<ClusterKey>,
    cluster_destroy: Sender<ClusterKey>,
    tile_create: Sender<TileRequest>,
    tile_destroy: Sender<TileKey>,
    log: Sender<String>,
}

impl MaterializationSink for RequestQueues {
    fn create_cluster(&mut self, key: ClusterKey) {
        let _ = self.cluster_create.send(key);
    }

    fn destroy_cluster(&mut self, key: ClusterKey) {
        let _ = self.cluster_destroy.send(key);
    }

    fn create_tile(&mut self, request: TileRequest) {
        let _ = self.tile_create.send(request);
    }

    fn destroy_tile(&mut self, key: TileKey) {
        let _ = self.tile_destroy.send(key);
    }

    fn log(&mut self, message: String) {
        let _ = self.log.send(message);
    }
}

/// Everything drained in one go, in processing order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestBatch {
    /// Clusters to create, FIFO.
    pub cluster_creates: Vec<ClusterKey>,
    /// Tiles to create, FIFO.
    pub tile_creates: Vec<TileRequest>,
    /// Tiles to destroy, FIFO.
    pub tile_destroys: Vec<TileKey>,
    /// Clusters to destroy, FIFO.
    pub cluster_destroys: Vec<ClusterKey>,
    /// Pending log lines, FIFO.
    pub logs: Vec<String>,
}

impl RequestBatch {
    /// Whether the batch holds no requests and no log lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cluster_creates.is_empty()
            && self.tile_creates.is_empty()
            && self.tile_destroys.is_empty()
            && self.cluster_destroys.is_empty()
            && self.logs.is_empty()
    }

    /// Number of materialization requests (log lines excluded).
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.cluster_creates.len()
            + self.tile_creates.len()
            + self.tile_destroys.len()
            + self.cluster_destroys.len()
    }
}

/// Consumer side.
#[derive(Debug)]
pub struct RequestReceivers {
    cluster_create: Receiver<ClusterKey>,
    cluster_destroy: Receiver<ClusterKey>,
    tile_create: Receiver<TileRequest>,
    tile_destroy: Receiver<TileKey>,
    log: Receiver<String>,
}

impl RequestReceivers {
    /// Takes everything currently pending (non-blocking).
    #[must_use]
    pub fn drain(&self) -> RequestBatch {
        // reverse dependency order, see module docs
        let cluster_destroys = self.cluster_destroy.try_iter().collect();
        let tile_destroys = self.tile_destroy.try_iter().collect();
        let tile_creates = self.tile_create.try_iter().collect();
        let cluster_creates = self.cluster_create.try_iter().collect();
        let logs = self.log.try_iter().collect();

        RequestBatch {
            cluster_creates,
            tile_creates,
            tile_destroys,
            cluster_destroys,
            logs,
        }
    }

    /// Requests waiting in the channels.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.cluster_create.len()
            + self.cluster_destroy.len()
            + self.tile_create.len()
            + self.tile_destroy.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilestream_shared::{IVec3, Quat, Vec3};
    use tilestream_wfc::{ClusterCoord, Tile};

    fn cluster(serial: u64) -> ClusterKey {
        ClusterKey {
            coord: ClusterCoord::new(0, 0, 0),
            serial,
        }
    }

    fn tile(key: u64) -> TileRequest {
        TileRequest {
            key: TileKey(key),
            cluster: cluster(0),
            world: IVec3::ZERO,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            tile: Tile::new(1, 0),
        }
    }

    #[test]
    fn test_drain_preserves_fifo_per_kind() {
        let (mut queues, receivers) = request_channels();
        queues.create_cluster(cluster(0));
        queues.create_tile(tile(1));
        queues.create_tile(tile(2));
        queues.destroy_tile(TileKey(1));
        queues.log("hello".to_string());
        assert_eq!(receivers.pending_count(), 4);

        let batch = receivers.drain();
        assert_eq!(batch.cluster_creates, vec![cluster(0)]);
        assert_eq!(
            batch.tile_creates.iter().map(|t| t.key).collect::<Vec<_>>(),
            vec![TileKey(1), TileKey(2)]
        );
        assert_eq!(batch.tile_destroys, vec![TileKey(1)]);
        assert_eq!(batch.logs, vec!["hello".to_string()]);
        assert_eq!(batch.request_count(), 4);

        assert!(receivers.drain().is_empty(), "drain takes everything");
    }

    #[test]
    fn test_send_after_consumer_gone_is_silent() {
        let (mut queues, receivers) = request_channels();
        drop(receivers);
        queues.create_cluster(cluster(1));
        queues.log("nobody listens".to_string());
    }
}
