//! Default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system.

use super::logging::LogFormat;
use crate::codec::CodePage;

// =============================================================================
// Port & connection limits
// =============================================================================

pub const fn default_port() -> u16 {
    17000
}

pub const fn default_max_connections() -> usize {
    4096
}

// =============================================================================
// Timers — login deadline, idle deadline
// =============================================================================

pub const fn default_login_timeout_secs() -> u64 {
    3
}

pub const fn default_idle_timeout_secs() -> u64 {
    600
}

// =============================================================================
// Outbound writer batching
// =============================================================================

pub const fn default_writer_flush_interval_ms() -> u64 {
    100
}

pub const fn default_writer_batch_max() -> usize {
    16
}

// =============================================================================
// Frame reader idle-shrink thresholds
// =============================================================================

pub const fn default_frame_shrink_capacity_bytes() -> usize {
    16 * 1024
}

pub const fn default_frame_shrink_occupancy_divisor() -> usize {
    4
}

// =============================================================================
// Legacy code page
// =============================================================================

pub const fn default_code_page() -> CodePage {
    CodePage::Windows1251
}

// =============================================================================
// Logging
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
