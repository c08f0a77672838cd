//! Save transfer between a Switch and a local directory.
//!
//! [`SyncEngine`] performs a single pull or push synchronously.
//! [`SyncRunner`] runs the engine off the async executor, one operation at
//! a time, with progress events and cancellation.

pub mod engine;
pub mod error;
pub mod runner;
mod source;
pub mod types;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncErrorKind};
pub use runner::SyncRunner;
pub use types::{SyncDirection, SyncEvent, SyncReport, SyncRequest};
