//! Process-wide wiring: shared state, the TCP accept loop, and shutdown
//! signalling.

pub mod acceptor;
pub mod context;
pub mod shutdown;

pub use context::ServerContext;
