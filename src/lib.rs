//! A small HTTP/1.1 server built directly on a byte stream.
//!
//! The [`http`] module holds the wire-level pieces: the incremental request
//! parser and the response writer state machine. [`net`] runs them over TCP
//! connections and [`handler`] is where responses get produced.

pub mod config;
pub mod handler;
pub mod http;
pub mod logging;
pub mod net;
