//! Server behavior configuration types.

use super::defaults::{
    default_code_page, default_frame_shrink_capacity_bytes, default_frame_shrink_occupancy_divisor,
    default_idle_timeout_secs, default_login_timeout_secs, default_max_connections,
    default_writer_batch_max, default_writer_flush_interval_ms,
};
use crate::codec::CodePage;
use serde::{Deserialize, Serialize};

/// Server configuration: connection admission, session timers, and the
/// outbound writer/frame-reader knobs threaded into each session.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Maximum number of simultaneously live connections. Beyond this,
    /// new accepts are refused at the socket level.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Deadline for a freshly-accepted connection to send a valid `Login`
    /// packet before it is dropped.
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    /// Deadline for an authenticated session's next inbound packet before
    /// it is treated as dead and disconnected.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Maximum delay between an outbound packet being queued and it being
    /// flushed to the socket, absent a larger batch arriving first.
    #[serde(default = "default_writer_flush_interval_ms")]
    pub writer_flush_interval_ms: u64,
    /// Maximum number of queued buffers coalesced into one vectored write.
    #[serde(default = "default_writer_batch_max")]
    pub writer_batch_max: usize,
    /// Idle read-buffer capacity above which a session's frame reader
    /// shrinks back down once mostly drained.
    #[serde(default = "default_frame_shrink_capacity_bytes")]
    pub frame_shrink_capacity_bytes: usize,
    /// Occupancy divisor used alongside `frame_shrink_capacity_bytes`: the
    /// buffer shrinks once live data is under `capacity / divisor`.
    #[serde(default = "default_frame_shrink_occupancy_divisor")]
    pub frame_shrink_occupancy_divisor: usize,
    /// Legacy 8-bit code page used to transcode `name` and string fields.
    #[serde(default = "default_code_page")]
    pub code_page: CodePage,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            login_timeout_secs: default_login_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            writer_flush_interval_ms: default_writer_flush_interval_ms(),
            writer_batch_max: default_writer_batch_max(),
            frame_shrink_capacity_bytes: default_frame_shrink_capacity_bytes(),
            frame_shrink_occupancy_divisor: default_frame_shrink_occupancy_divisor(),
            code_page: default_code_page(),
        }
    }
}
