use anyhow::Result;

pub fn check_bind(bind: &str) -> Result<()> {
    anyhow::ensure!(!bind.is_empty(), "vehicle.bind missing");
    let addr: std::net::SocketAddr = bind
        .parse()
        .map_err(|_| anyhow::anyhow!("vehicle.bind `{}` is not host:port", bind))?;
    anyhow::ensure!(addr.port() != 0, "vehicle.bind port must be nonzero");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_loopback_and_rejects_garbage() {
        assert!(check_bind("127.0.0.1:12002").is_ok());
        assert!(check_bind("").is_err());
        assert!(check_bind("not-an-addr").is_err());
        assert!(check_bind("127.0.0.1:0").is_err());
    }
}
