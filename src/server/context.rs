//! Process-wide state shared by every connection: the world, the config it
//! was built from, activity counters, and the shutdown signal.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::config::Config;
use crate::metrics::ServerMetrics;
use crate::world::World;

/// Everything a connection task needs that outlives the connection itself.
///
/// Constructed once in `main` and shared behind an `Arc`; per [`crate::world`]
/// design notes, this sits in place of the source's global singletons,
/// passed explicitly rather than reached for as ambient state.
pub struct ServerContext {
    pub world: World,
    pub metrics: ServerMetrics,
    pub config: Config,
    pub shutdown: Arc<Notify>,
}

impl ServerContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            world: World::new(),
            metrics: ServerMetrics::new(),
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }
}
