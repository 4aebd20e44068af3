//! # Tilestream
//!
//! Streams an incrementally generated WFC tile map around a moving viewpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  viewpoint  ┌──────────────────────┐
//! │  Host frame     │ ──────────▶ │  StreamingScheduler  │
//! │  (TileStreamer) │             │  (sync or worker)    │
//! └────────▲────────┘             └──────────┬───────────┘
//!          │                                 │ Tilemap sink
//!          │  drain + apply                  ▼
//! ┌────────┴────────┐             ┌──────────────────────┐
//! │ PresenterBridge │ ◀────────── │  Request channels    │
//! └─────────────────┘             └──────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **One thread mutates the map**: the caller in synchronous mode, the
//!    worker in threaded mode.
//! 2. **Requests are the only handoff**: the presenter never sees solver
//!    state, only owned requests drained in dependency order.
//! 3. **Cooperative cancellation**: a viewpoint jump or shutdown is noticed
//!    between generation steps.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod presenter;
pub mod requests;
pub mod scheduler;
pub mod streamer;
pub mod viewpoint;
pub mod worker;

pub use config::{StreamingConfig, WfcConfig};
pub use error::{ConfigError, ConfigResult, SchedulerError, SchedulerResult};
pub use presenter::{ApplyReport, Presenter, PresenterBridge};
pub use requests::{request_channels, RequestBatch, RequestQueues, RequestReceivers};
pub use scheduler::{PassReport, StreamingScheduler};
pub use streamer::{FrameReport, TileStreamer};
pub use viewpoint::{Projection, Viewpoint};
pub use worker::WorkerHandle;
