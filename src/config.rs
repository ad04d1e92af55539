//! Server configuration from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind (CODESYNC_HOST)
    pub host: IpAddr,
    /// Port to bind (PORT)
    pub port: u16,
    /// Directory with the built web client (STATIC_DIR)
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("dist"),
        }
    }
}

/// Read a variable, treating blank values as unset
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl ServerConfig {
    /// Load config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match non_empty_var("CODESYNC_HOST") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid CODESYNC_HOST '{}', using {}", raw, defaults.host);
                defaults.host
            }),
            None => defaults.host,
        };

        let port = match non_empty_var("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let static_dir = non_empty_var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        Self {
            host,
            port,
            static_dir,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("CODESYNC_HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("STATIC_DIR");
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr().port(), 5000);
    }

    #[test]
    #[serial]
    fn test_reads_env() {
        clear_env();
        std::env::set_var("CODESYNC_HOST", "127.0.0.1");
        std::env::set_var("PORT", "8080");
        std::env::set_var("STATIC_DIR", "public");

        let config = ServerConfig::from_env();
        assert_eq!(config.addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.static_dir, PathBuf::from("public"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("CODESYNC_HOST", "not-an-ip");
        std::env::set_var("PORT", "eighty");
        std::env::set_var("STATIC_DIR", "   ");

        let config = ServerConfig::from_env();
        assert_eq!(config, ServerConfig::default());
        clear_env();
    }
}
