//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the eventer:
//! the event data model, sink descriptors, the `EventSink` trait and the
//! configuration model. Business crates depend on this crate only.
//!
//! ## Time Model
//! - Timestamps are UTC (`chrono::DateTime<Utc>`)
//! - `last_timestamp` is optional, as it is on Kubernetes events

mod config;
mod descriptor;
mod error;
mod event;
mod sink;

pub use config::*;
pub use descriptor::{SinkDescriptor, SinkOptions};
pub use error::*;
pub use event::*;
pub use sink::*;
