//! Client and server service layer.
//!
//! The daemon owns the listening socket and the accept loop; every
//! accepted connection gets its own [`worker::ConnectionWorker`] task so
//! a slow peer never blocks the listener. The client dials, reads the
//! greeting and sends one encoded step list.
pub mod client;
pub mod daemon;
pub mod worker;
