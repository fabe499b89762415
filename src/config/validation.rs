//! Configuration validation functions.

use super::Config;

/// Sanity-checks a loaded [`Config`]. Kept deliberately small: there is no
/// TLS, auth, or dashboard surface to validate here, just the handful of
/// knobs that would otherwise produce a silently-broken server.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.port == 0 {
        anyhow::bail!("server.port must be nonzero");
    }
    if config.server.max_connections == 0 {
        anyhow::bail!("server.max_connections must be nonzero");
    }
    if config.server.login_timeout_secs == 0 {
        anyhow::bail!("server.login_timeout_secs must be nonzero");
    }
    if config.server.idle_timeout_secs == 0 {
        anyhow::bail!("server.idle_timeout_secs must be nonzero");
    }
    if config.server.writer_batch_max == 0 {
        anyhow::bail!("server.writer_batch_max must be nonzero");
    }
    if config.server.frame_shrink_occupancy_divisor == 0 {
        anyhow::bail!("server.frame_shrink_occupancy_divisor must be nonzero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = Config::default();
        config.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_max_connections() {
        let mut config = Config::default();
        config.server.max_connections = 0;
        assert!(validate_config(&config).is_err());
    }
}
