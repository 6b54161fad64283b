//! iolatency Userspace Library
//!
//! Provides reusable components for loading the block I/O latency probe,
//! draining its histogram, and rendering it.

pub mod collector;
pub mod loader;
pub mod poller;
pub mod render;
pub mod types;

pub use collector::{CounterSource, HistogramCollector};
pub use loader::ProbeLoader;
pub use poller::Poller;
pub use render::{JsonRenderer, PrometheusRenderer, RendererType, SnapshotRenderer, TableRenderer};
pub use types::*;
