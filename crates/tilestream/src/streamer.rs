//! # Tile Streamer
//!
//! The one type a host drives per frame. Both modes share the scheduler and
//! the request path; only the thread that runs generation differs.
//!
//! - **Synchronous**: `update` runs one budgeted pass plus eviction on the
//!   caller's thread, then applies the requests it produced.
//! - **Threaded**: `update` publishes the viewpoint to the worker and
//!   applies whatever the worker produced since the last frame.

use tilestream_wfc::Tilemap;

use crate::error::SchedulerResult;
use crate::presenter::{ApplyReport, Presenter, PresenterBridge};
use crate::requests::{request_channels, RequestReceivers};
use crate::scheduler::{PassReport, StreamingScheduler};
use crate::viewpoint::Viewpoint;
use crate::worker::WorkerHandle;

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// The map changed (a cell was observed or a cluster evicted).
    pub updated: bool,
    /// Requests applied to the presenter.
    pub applied: ApplyReport,
    /// Generation pass of this frame (synchronous mode only).
    pub pass: Option<PassReport>,
    /// Clusters evicted this frame (synchronous mode only).
    pub evicted: usize,
}

enum Mode {
    Synchronous {
        tilemap: Box<Tilemap>,
        scheduler: StreamingScheduler,
        receivers: RequestReceivers,
    },
    Threaded(WorkerHandle),
}

/// Per-frame driver around a tilemap, a scheduler and a presenter.
pub struct TileStreamer<P: Presenter> {
    mode: Mode,
    bridge: PresenterBridge<P>,
}

impl<P: Presenter> std::fmt::Debug for TileStreamer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStreamer")
            .field("threaded", &self.is_threaded())
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl<P: Presenter> TileStreamer<P> {
    /// Builds a streamer. `scheduler.config().multithreaded` picks the mode.
    ///
    /// The tilemap's sink is replaced by the request channels. Stamp fixed
    /// tiles with [`Self::tilemap_mut`] (synchronous mode) so they reach
    /// the presenter.
    ///
    /// # Errors
    ///
    /// Fails only if the worker thread cannot be spawned.
    pub fn new(
        mut tilemap: Tilemap,
        scheduler: StreamingScheduler,
        presenter: P,
    ) -> SchedulerResult<Self> {
        let mode = if scheduler.config().multithreaded {
            Mode::Threaded(WorkerHandle::spawn(tilemap, scheduler)?)
        } else {
            let (queues, receivers) = request_channels();
            tilemap.set_sink(Box::new(queues));
            Mode::Synchronous {
                tilemap: Box::new(tilemap),
                scheduler,
                receivers,
            }
        };
        Ok(Self {
            mode,
            bridge: PresenterBridge::new(presenter),
        })
    }

    /// Whether generation runs on a worker thread.
    #[must_use]
    pub const fn is_threaded(&self) -> bool {
        matches!(self.mode, Mode::Threaded(_))
    }

    /// The tilemap, in synchronous mode.
    pub fn tilemap_mut(&mut self) -> Option<&mut Tilemap> {
        match &mut self.mode {
            Mode::Synchronous { tilemap, .. } => Some(&mut **tilemap),
            Mode::Threaded(_) => None,
        }
    }

    /// The tilemap, in synchronous mode.
    #[must_use]
    pub fn tilemap(&self) -> Option<&Tilemap> {
        match &self.mode {
            Mode::Synchronous { tilemap, .. } => Some(&**tilemap),
            Mode::Threaded(_) => None,
        }
    }

    /// Presenter bridge (handle maps and presenter).
    #[must_use]
    pub const fn bridge(&self) -> &PresenterBridge<P> {
        &self.bridge
    }

    /// The presenter.
    #[must_use]
    pub const fn presenter(&self) -> &P {
        self.bridge.presenter()
    }

    /// Runs one frame for `viewpoint`.
    pub fn update(&mut self, viewpoint: &Viewpoint) -> FrameReport {
        match &mut self.mode {
            Mode::Synchronous {
                tilemap,
                scheduler,
                receivers,
            } => {
                let (pass, evicted) = scheduler.tick(tilemap, viewpoint);
                let applied = self.bridge.apply(receivers.drain());
                FrameReport {
                    updated: pass.updated() || !evicted.is_empty(),
                    applied,
                    pass: Some(pass),
                    evicted: evicted.len(),
                }
            }
            Mode::Threaded(worker) => {
                worker.set_viewpoint(*viewpoint);
                let applied = worker.pump(&mut self.bridge);
                FrameReport {
                    updated: worker.take_updated(),
                    applied,
                    pass: None,
                    evicted: 0,
                }
            }
        }
    }

    /// Stops generation, applies every request still pending and returns
    /// the tilemap and the presenter.
    ///
    /// # Errors
    ///
    /// [`crate::SchedulerError::WorkerPanicked`] if the worker died.
    pub fn shutdown(self) -> SchedulerResult<(Tilemap, P)> {
        let Self { mode, mut bridge } = self;
        let tilemap = match mode {
            Mode::Synchronous {
                tilemap, receivers, ..
            } => {
                bridge.apply(receivers.drain());
                *tilemap
            }
            Mode::Threaded(worker) => {
                let (tilemap, receivers) = worker.shutdown()?;
                bridge.apply(receivers.drain());
                tilemap
            }
        };
        Ok((tilemap, bridge.into_presenter()))
    }
}
