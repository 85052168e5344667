use anyhow::Result;

use crate::ConsoleConfig;

pub fn check_console(cfg: &ConsoleConfig) -> Result<()> {
    anyhow::ensure!(
        (1..=120).contains(&cfg.frame_rate_hz),
        "console.frame_rate_hz should be 1..120"
    );
    anyhow::ensure!(cfg.max_inflight >= 1, "console.max_inflight must be at least 1");
    anyhow::ensure!(cfg.request_timeout_ms >= 50, "console.request_timeout_ms too low");
    cfg.endpoint
        .parse::<std::net::SocketAddr>()
        .map_err(|_| anyhow::anyhow!("console.endpoint `{}` is not host:port", cfg.endpoint))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        assert!(check_console(&ConsoleConfig::default()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cfg = ConsoleConfig { frame_rate_hz: 0, ..Default::default() };
        assert!(check_console(&cfg).is_err());

        let cfg = ConsoleConfig { max_inflight: 0, ..Default::default() };
        assert!(check_console(&cfg).is_err());

        let cfg = ConsoleConfig { endpoint: "nowhere".into(), ..Default::default() };
        assert!(check_console(&cfg).is_err());
    }
}
