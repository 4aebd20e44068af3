//! # Generation Worker
//!
//! Runs the scheduler continuously on a dedicated thread.
//!
//! ```text
//!   Consumer thread                         Worker thread
//!   ───────────────                         ─────────────
//!   set_viewpoint ──> [Mutex<ViewSlot>] ──> adopt latest viewpoint, clear reset
//!                     (reset: AtomicBool)   run_pass (polls reset + exit)
//!                                           evict
//!   take_updated  <── (updated: AtomicBool) <──
//!   drain         <══ request channels   <══ Tilemap sink
//!   shutdown      ──> (exit: AtomicBool) ──> loop returns the Tilemap
//! ```
//!
//! The tilemap lives on the worker for the whole run and comes back on
//! [`WorkerHandle::shutdown`]. Cancellation is cooperative: the exit flag is
//! read at the top of the loop and between generation steps.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tilestream_wfc::Tilemap;

use crate::error::{SchedulerError, SchedulerResult};
use crate::presenter::{ApplyReport, Presenter, PresenterBridge};
use crate::requests::{request_channels, RequestBatch, RequestReceivers};
use crate::scheduler::StreamingScheduler;
use crate::viewpoint::Viewpoint;

/// Latest published viewpoint and the one the worker is using.
#[derive(Default)]
struct ViewSlot {
    latest: Option<Viewpoint>,
    active: Option<Viewpoint>,
}

/// State shared between the worker and its handle.
struct Shared {
    view: Mutex<ViewSlot>,
    reset: AtomicBool,
    updated: AtomicBool,
    exit: AtomicBool,
    restarts: AtomicU64,
}

/// Owner-side handle of a running worker.
pub struct WorkerHandle {
    shared: Arc<Shared>,
    receivers: RequestReceivers,
    thread: Option<JoinHandle<Tilemap>>,
    reset_distance: f32,
    reset_angle_degrees: f32,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("running", &self.is_running())
            .field("pending", &self.receivers.pending_count())
            .finish_non_exhaustive()
    }
}

impl WorkerHandle {
    /// Moves `tilemap` onto a new worker thread.
    ///
    /// The tilemap's sink is replaced by the request channels; requests it
    /// sent to its previous sink are not replayed.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Spawn`] if the thread cannot be started. The
    /// tilemap is dropped in that case.
    pub fn spawn(mut tilemap: Tilemap, scheduler: StreamingScheduler) -> SchedulerResult<Self> {
        let (queues, receivers) = request_channels();
        tilemap.set_sink(Box::new(queues));

        let shared = Arc::new(Shared {
            view: Mutex::new(ViewSlot::default()),
            reset: AtomicBool::new(false),
            updated: AtomicBool::new(false),
            exit: AtomicBool::new(false),
            restarts: AtomicU64::new(0),
        });
        let reset_distance = scheduler.config().reset_distance;
        let reset_angle_degrees = scheduler.config().reset_angle_degrees;

        let worker_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("tilestream-worker".to_string())
            .spawn(move || worker_loop(tilemap, &scheduler, &worker_shared))
            .map_err(SchedulerError::Spawn)?;

        tracing::info!("Generation worker started");
        Ok(Self {
            shared,
            receivers,
            thread: Some(thread),
            reset_distance,
            reset_angle_degrees,
        })
    }

    /// Publishes the viewpoint for the next pass. A large enough change
    /// from the viewpoint in use aborts the current pass.
    ///
    /// Returns whether a restart was requested.
    pub fn set_viewpoint(&self, viewpoint: Viewpoint) -> bool {
        let mut slot = self.shared.view.lock();
        slot.latest = Some(viewpoint);
        let jumped = slot.active.is_some_and(|active| {
            viewpoint.differs_from(&active, self.reset_distance, self.reset_angle_degrees)
        });
        if jumped {
            self.shared.reset.store(true, Ordering::Release);
        }
        jumped
    }

    /// Viewpoint of the pass currently running, if any.
    #[must_use]
    pub fn active_viewpoint(&self) -> Option<Viewpoint> {
        self.shared.view.lock().active
    }

    /// Passes cut short by a viewpoint jump so far.
    #[must_use]
    pub fn restarts(&self) -> u64 {
        self.shared.restarts.load(Ordering::Acquire)
    }

    /// Whether the map changed since the last call. Clears the flag.
    #[must_use]
    pub fn take_updated(&self) -> bool {
        self.shared.updated.swap(false, Ordering::AcqRel)
    }

    /// Takes every pending request.
    #[must_use]
    pub fn drain(&self) -> RequestBatch {
        self.receivers.drain()
    }

    /// Drains and applies pending requests.
    pub fn pump<P: Presenter>(&self, bridge: &mut PresenterBridge<P>) -> ApplyReport {
        bridge.apply(self.receivers.drain())
    }

    /// Whether the worker thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the worker, waits for it and returns the tilemap. Requests
    /// still in the channels stay there; drain them first if needed.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::WorkerPanicked`] if the worker did not exit cleanly.
    pub fn shutdown(mut self) -> SchedulerResult<(Tilemap, RequestReceivers)> {
        self.shared.exit.store(true, Ordering::Release);
        let thread = self.thread.take().ok_or(SchedulerError::WorkerPanicked)?;
        let tilemap = thread.join().map_err(|_| SchedulerError::WorkerPanicked)?;
        tracing::info!("Generation worker stopped");

        // Drop sees no thread and does nothing more.
        let (_, placeholder) = request_channels();
        let receivers = std::mem::replace(&mut self.receivers, placeholder);
        Ok((tilemap, receivers))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shared.exit.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Generation worker panicked");
            }
        }
    }
}

fn worker_loop(mut tilemap: Tilemap, scheduler: &StreamingScheduler, shared: &Shared) -> Tilemap {
    let idle = Duration::from_millis(scheduler.config().idle_sleep_ms);

    while !shared.exit.load(Ordering::Acquire) {
        let viewpoint = {
            let mut slot = shared.view.lock();
            slot.active = slot.latest;
            shared.reset.store(false, Ordering::Release);
            slot.active
        };
        let Some(viewpoint) = viewpoint else {
            thread::sleep(idle);
            continue;
        };

        let report = scheduler.run_pass(&mut tilemap, &viewpoint, None, || {
            shared.reset.load(Ordering::Acquire) || shared.exit.load(Ordering::Acquire)
        });
        if report.updated() {
            shared.updated.store(true, Ordering::Release);
        }
        if report.aborted && !shared.exit.load(Ordering::Acquire) {
            shared.restarts.fetch_add(1, Ordering::AcqRel);
            tracing::debug!("Generation pass restarted after {:?}", report.elapsed);
        }

        let evicted = scheduler.evict(&mut tilemap, &viewpoint);
        if !evicted.is_empty() {
            shared.updated.store(true, Ordering::Release);
        }
        if !report.updated() && evicted.is_empty() {
            thread::sleep(idle);
        }
    }

    tilemap
}
