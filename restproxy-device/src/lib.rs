//! RestProxy device plugin
//!
//! Adapts the device plugin contract of a host orchestrator to an arbitrary
//! REST backend that knows about real hardware:
//! - `GET /fingerprint` polled on the configured period (inventory/health)
//! - `GET /stats` polled on a caller-chosen interval (metrics)
//! - `POST /reserve` on demand (device reservation before a workload runs)

pub mod cancel;
pub mod config;
pub mod error;
pub mod plugin;
pub mod poller;
pub mod transport;
pub mod types;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::{PluginConfig, RunnerConfig, Settings};
pub use error::{ErrorKind, ProxyError};
pub use plugin::{DevicePlugin, PluginInfo, RestProxyPlugin};
pub use poller::{Poller, SnapshotStream};
pub use transport::HttpTransport;
pub use types::{ContainerReservation, FingerprintResponse, StatsResponse};
