//! # Error
//!
//! Error types used throughout the crate.
//!
//! Failures are contained at the operation that caused them: a decode
//! error aborts one worker iteration, a dial error aborts one client
//! session, bind contention aborts server startup. Nothing here is meant
//! to crash the process except errors escaping the accept call itself.
//!
//! A custom `Result<T>` alias is provided to simplify signatures.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The listening address is already taken by another server instance.
    #[error("already listening on {0}")]
    AlreadyListening(String),

    /// Dial failure. Aborts the attempting client session only.
    #[error("unable to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Read/write failure mid-session.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The received payload is not a well-formed step-list document.
    #[error("malformed payload: {0}")]
    Format(#[from] FormatError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Decode failures for the step-list document.
///
/// A payload larger than the read buffer arrives truncated and fails
/// decode with one of these variants rather than yielding a silently
/// partial list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("document ended unexpectedly")]
    UnexpectedEnd,

    #[error("expected element <{expected}>, found <{found}>")]
    UnexpectedElement { expected: String, found: String },

    #[error("missing closing tag </{0}>")]
    UnclosedElement(String),

    #[error("unexpected trailing content after document root")]
    TrailingContent,

    #[error("invalid character reference: {0}")]
    BadEntity(String),
}
