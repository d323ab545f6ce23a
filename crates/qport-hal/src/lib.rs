//! qport Hardware Abstraction Layer
//!
//! The common surface every qport backend implements:
//!
//! - the async [`Backend`] trait: compile, validate, submit, poll, cancel;
//! - persistent [`ResultHandle`]s that survive across processes;
//! - [`BackendResult`] and [`Counts`] with readout postprocessing;
//! - a shared [`ResultCache`];
//! - [`ExtensionConfig`] sections in the user config file.
//!
//! # Example: Resuming a Handle
//!
//! ```rust
//! use qport_hal::{HandleItem, HandleKind, ResultHandle};
//!
//! let handle = ResultHandle::new([HandleItem::from("job-1"), HandleItem::from(100)]);
//! let text = handle.to_string();
//! assert_eq!(text, "('job-1', 100)");
//!
//! let resumed: ResultHandle = text.parse().unwrap();
//! assert!(resumed.matches(&[HandleKind::Str, HandleKind::Int]));
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod handle;
pub mod info;
pub mod result;
pub mod status;

pub use backend::{Backend, DEFAULT_POLL_WAIT, expand_shots};
pub use cache::{CacheEntry, ResultCache};
pub use config::{CONFIG_PATH_ENV, ExtensionConfig, default_config_path};
pub use error::{HalError, HalResult};
pub use handle::{HandleItem, HandleKind, ResultHandle};
pub use info::{Architecture, BackendInfo, NODE_REGISTER};
pub use result::{BackendResult, Counts, Outcome};
pub use status::{CircuitStatus, StatusEnum};
