#![forbid(unsafe_code)]
//! tessera-core library.
//!
//! Shared contracts for the graph engine: the error taxonomy, engine
//! configuration, logging bootstrap, snapshot locks and the content-record
//! helpers extraction adapters build on.
//!
//! # Conventions
//!
//! - **Errors**: Return [`Result`] with the crate [`Error`]; callers match on
//!   variants or [`Error::code`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod content;
pub mod error;
pub mod ids;
pub mod lock;
pub mod logging;
pub mod markdown;

pub use error::{Error, ErrorCode, Result};
