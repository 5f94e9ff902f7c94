//! Client configuration and address resolution.

use std::net::SocketAddr;

use crate::error::ClientError;

/// Settings the client needs to start its two loops.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Where display frames are sent, as `host:port`.
    pub gui_address: String,
    /// Name sent to the server in Join.
    pub player_name: String,
    /// Local UDP port the display sends input to.
    pub port: u16,
    /// Game server endpoint, as `host:port`.
    pub server_address: String,
}

impl ClientConfig {
    /// Rejects a player name that Join cannot carry.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.player_name.len() > u8::MAX as usize {
            return Err(ClientError::InvalidConfig(format!(
                "player name is {} bytes, at most {} allowed",
                self.player_name.len(),
                u8::MAX
            )));
        }
        Ok(())
    }
}

/// Splits `host:port` at the last colon, so bare IPv6 literals such as
/// `::1:2022` and bracketed ones such as `[::1]:2022` both work.
pub fn split_host_port(address: &str) -> Result<(&str, u16), ClientError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ClientError::InvalidAddress(format!("{address}: missing port")))?;

    let port = port
        .parse::<u16>()
        .map_err(|_| ClientError::InvalidAddress(format!("{address}: bad port {port:?}")))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ClientError::InvalidAddress(format!("{address}: missing host")));
    }

    Ok((host, port))
}

/// Resolves `host:port` to the first matching socket address.
pub async fn resolve(address: &str) -> Result<SocketAddr, ClientError> {
    let (host, port) = split_host_port(address)?;
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| ClientError::InvalidAddress(format!("{address}: {e}")))?
        .next()
        .ok_or_else(|| ClientError::InvalidAddress(format!("{address}: no addresses found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_hostname() {
        assert_eq!(split_host_port("localhost:2022").unwrap(), ("localhost", 2022));
    }

    #[test]
    fn test_split_ipv6() {
        assert_eq!(split_host_port("::1:2022").unwrap(), ("::1", 2022));
        assert_eq!(split_host_port("[::1]:2022").unwrap(), ("::1", 2022));
    }

    #[test]
    fn test_split_rejects_bad_input() {
        let invalid = ["localhost", "localhost:", "localhost:99999", "host:port", ":2022"];
        for address in invalid {
            assert!(
                split_host_port(address).is_err(),
                "should reject {}",
                address
            );
        }
    }

    #[test]
    fn test_validate_player_name_length() {
        let mut config = ClientConfig {
            gui_address: "localhost:2023".to_string(),
            player_name: "x".repeat(255),
            port: 0,
            server_address: "localhost:2022".to_string(),
        };
        assert!(config.validate().is_ok());

        config.player_name.push('x');
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_resolve_ipv4_literal() {
        let addr = resolve("127.0.0.1:4000").await.unwrap();
        assert_eq!(addr, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_ipv6_literal() {
        let addr = resolve("::1:4000").await.unwrap();
        assert_eq!(addr, "[::1]:4000".parse::<SocketAddr>().unwrap());
    }
}
