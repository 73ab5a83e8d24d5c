//! Status aggregation for an Anki sync server.
//!
//! Everything here observes state the sync server leaves on disk (state
//! files, logs, user directories, backup archives) plus a few host counters.
//! The only side effects are the two external executables run by
//! [`compilers::BackupGateway::create`] and [`compilers::send_notification`].

#[macro_use]
extern crate tracing;

pub mod compilers;
pub mod error;
pub mod format;
pub mod probes;
pub mod process;
pub mod state;

pub use error::{
    Error,
    Result,
};
pub use process::ActionResult;
