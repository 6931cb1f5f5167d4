//! Server configuration from the command line

use clap::Parser;

/// Flight control dashboard server
#[derive(Debug, Clone, Parser)]
#[command(name = "flight-api", version, about)]
pub struct ServerConfig {
    /// Drive a real drone instead of the simulator
    #[arg(long)]
    pub real: bool,

    /// Host to bind the web server
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the web server
    #[arg(long, default_value_t = 5000)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse_from(["flight-api"]);
        assert!(!config.real);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_flags() {
        let config =
            ServerConfig::parse_from(["flight-api", "--real", "--host", "127.0.0.1", "--port", "8080"]);
        assert!(config.real);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }
}
