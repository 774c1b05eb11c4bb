use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:1234";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:1234";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Address the client dials, and redials on reconnect.
    #[serde(default = "default_server_addr")]
    pub server_addr: String,
    /// Keep at most this many messages; unset means unbounded.
    #[serde(default)]
    pub max_history: Option<usize>,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_server_addr() -> String {
    DEFAULT_SERVER_ADDR.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            server_addr: default_server_addr(),
            max_history: None,
        }
    }
}

impl AppConfig {
    pub fn with_listen_addr(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.listen_addr = addr;
        }
        self
    }

    pub fn with_server_addr(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.server_addr = addr;
        }
        self
    }

    pub fn with_max_history(mut self, max_history: Option<usize>) -> Self {
        if max_history.is_some() {
            self.max_history = max_history;
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
