//! # Steplog
//!
//! Structured logging combined with a small TCP client/server exchange.
//!
//! A server accepts connections and hands each one to its own worker
//! task. The worker greets the peer, then repeatedly probes it and
//! decodes the step-list document the client sends back. A client dials
//! the server, reads the greeting, sends its encoded step list and
//! disconnects after a short linger.
//!
//! The main components include:
//! - Core: the step-list data model and its textual document codec
//! - Service: the listening daemon, per-connection workers and the client
//! - Utils: the logging sink and shared timing constants
//!
//! Wire traffic is plaintext over TCP: the server-side literals
//! (greeting and probe) followed by the client's step-list document,
//! sent as a single write and read in a single fixed-size read.
pub mod config;
pub mod error;

pub mod core {
    pub mod codec;
    pub mod step;
}

pub mod service; // daemon + worker + client
pub mod utils;   // logging sink, timing constants

pub use config::Settings;
pub use error::*;
pub use core::step::{StepList, StepRecord};
