//! Server configuration loaded from environment variables

use crate::state::SessionPolicy;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Optional directory with the presentation layer's static files
    pub static_dir: Option<PathBuf>,
    /// Capacity of the fan-out channel; slower connections get resynced
    pub broadcast_capacity: usize,
    /// End polls on the server when their time limit runs out
    pub server_timer: bool,
    pub require_active_poll: bool,
    /// Restrict createPoll/endPoll/removeStudent to teacher connections
    pub enforce_roles: bool,
    pub chat_history_limit: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: None,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            server_timer: true,
            require_active_poll: false,
            enforce_roles: false,
            chat_history_limit: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            host: env_parse("HOST", defaults.host),
            port: env_parse("PORT", defaults.port),
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            broadcast_capacity: env_parse("BROADCAST_CAPACITY", defaults.broadcast_capacity)
                .max(1),
            server_timer: env_flag("POLL_SERVER_TIMER", defaults.server_timer),
            require_active_poll: env_flag("POLL_REQUIRE_ACTIVE", defaults.require_active_poll),
            enforce_roles: env_flag("POLL_ENFORCE_ROLES", defaults.enforce_roles),
            chat_history_limit: std::env::var("CHAT_HISTORY_LIMIT")
                .ok()
                .and_then(|v| parse_or_warn("CHAT_HISTORY_LIMIT", &v)),
        };

        tracing::info!(
            server_timer = config.server_timer,
            require_active_poll = config.require_active_poll,
            enforce_roles = config.enforce_roles,
            chat_history_limit = ?config.chat_history_limit,
            "Config loaded"
        );
        config
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            require_active_poll: self.require_active_poll,
            chat_history_limit: self.chat_history_limit,
        }
    }
}

/// Anything but "0" or "false" turns a flag on
fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_or_warn(name, &v))
        .unwrap_or(default)
}

fn parse_or_warn<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "STATIC_DIR",
        "BROADCAST_CAPACITY",
        "POLL_SERVER_TIMER",
        "POLL_REQUIRE_ACTIVE",
        "POLL_ENFORCE_ROLES",
        "CHAT_HISTORY_LIMIT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env();

        assert_eq!(config.bind_addr(), "0.0.0.0:4000".parse().unwrap());
        assert!(config.static_dir.is_none());
        assert!(config.server_timer);
        assert!(!config.require_active_poll);
        assert!(!config.enforce_roles);
        assert_eq!(config.chat_history_limit, None);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("HOST", "127.0.0.1");
        std::env::set_var("PORT", "8080");
        std::env::set_var("STATIC_DIR", "public");
        std::env::set_var("POLL_SERVER_TIMER", "false");
        std::env::set_var("POLL_REQUIRE_ACTIVE", "1");
        std::env::set_var("POLL_ENFORCE_ROLES", "true");
        std::env::set_var("CHAT_HISTORY_LIMIT", "50");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
        assert!(!config.server_timer);
        assert!(config.require_active_poll);
        assert!(config.enforce_roles);
        assert_eq!(config.session_policy().chat_history_limit, Some(50));
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("BROADCAST_CAPACITY", "0");
        std::env::set_var("CHAT_HISTORY_LIMIT", "lots");

        let config = ServerConfig::from_env();
        clear_env();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.broadcast_capacity, 1);
        assert_eq!(config.chat_history_limit, None);
    }
}
