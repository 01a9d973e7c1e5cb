// Ports, timeouts, topics, and the command-line surface
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

// TCP port the teleop client connects to
pub const DEFAULT_PORT: u16 = 8080;

// Pending connections kept by the kernel while a client is being served
pub const LISTEN_BACKLOG: u32 = 3;

// Silence allowed before the watchdog forces a stop
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(3);

// Pause before retrying a failed accept
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

// Zenoh topics
pub const TOPIC_CMD_VEL: &str = "cmd_vel"; // velocity commands
pub const TOPIC_HEALTH: &str = "teleop/state/health"; // link health

/// Command-line options for the bridge binary
#[derive(Debug, Clone, Parser)]
#[command(name = "teleop-bridge", version, about = "TCP teleop frames -> cmd_vel")]
pub struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Runtime settings consumed by the bridge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeConfig {
    pub listen_addr: SocketAddr,
    pub watchdog_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            watchdog_timeout: WATCHDOG_TIMEOUT,
        }
    }
}

impl From<&Args> for BridgeConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), args.port),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol() {
        let args = Args::parse_from(["teleop-bridge"]);
        let config = BridgeConfig::from(&args);
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.watchdog_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_port_override() {
        let args = Args::parse_from(["teleop-bridge", "-p", "9000"]);
        let config = BridgeConfig::from(&args);
        assert_eq!(config.listen_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.watchdog_timeout, WATCHDOG_TIMEOUT);
    }

    #[test]
    fn test_only_port_is_configurable() {
        for flag in ["--watchdog-ms", "--bind", "--topic", "--health-topic"] {
            assert!(Args::try_parse_from(["teleop-bridge", flag, "1"]).is_err(), "{}", flag);
        }
    }
}
