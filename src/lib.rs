#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Worms Lobby Server
//!
//! A TCP lobby server for the legacy Worms2-family binary protocol: clients
//! log in with a name, then create and join chat rooms and peer-hosted
//! games, all multiplexed over a single framed request/response connection
//! with server-originated broadcasts.
//!
//! No database, no TLS, no persistence — the entire world is in-memory and
//! discarded on restart.

/// Legacy byte-level primitives: little-endian integers and 8-bit code page transcoding.
pub mod codec;

/// Server configuration and environment variables.
pub mod config;

/// Structured logging configuration.
pub mod logging;

/// Counters describing server activity.
pub mod metrics;

/// Wire protocol: packet codes, flags, session-info records, and the frame reader.
pub mod protocol;

/// Per-connection state machine: login handshake, dispatch loop, outbound writer.
pub mod session;

/// Per-code semantic rules: validation, world mutation, broadcast selection.
pub mod handler;

/// Main server orchestration: acceptor, shutdown, and the in-memory world.
pub mod server;

/// Concurrent world state: users, rooms, games, and ID allocation.
pub mod world;
