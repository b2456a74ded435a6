//! Runtime configuration model. Loaded from YAML by the binary crate;
//! every field has a default so a partial file (or none at all) works.

use serde::{Deserialize, Serialize};

use andesite_protocol::minecraft::java::status::{ServerStatus, StatusPlayers, StatusVersion};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub motd: String,
    pub max_players: i32,
    /// Enables the RSA/AES login handshake.
    pub online_mode: bool,
    /// Negative disables compression.
    pub compression_threshold: i32,
    pub keep_alive_interval_secs: u64,
    pub keep_alive_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub protocol_version: i32,
    pub version_name: String,
    pub favicon: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:25565".to_string(),
            motd: "An Andesite Server".to_string(),
            max_players: 20,
            online_mode: true,
            compression_threshold: 256,
            keep_alive_interval_secs: 10,
            keep_alive_timeout_secs: 30,
            read_timeout_secs: 30,
            protocol_version: 767,
            version_name: "1.21".to_string(),
            favicon: None,
        }
    }
}

impl ServerConfig {
    pub fn compression_enabled(&self) -> bool {
        self.compression_threshold >= 0
    }

    /// Status-ping document for the current player count.
    pub fn server_status(&self, online: i32) -> ServerStatus {
        ServerStatus {
            version: StatusVersion {
                name: self.version_name.clone(),
                protocol: self.protocol_version,
            },
            players: StatusPlayers {
                max: self.max_players,
                online,
                sample: Vec::new(),
            },
            description: serde_json::json!({ "text": self.motd }),
            favicon: self.favicon.clone(),
            enforces_secure_chat: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0:25565");
        assert!(config.compression_enabled());

        let status = config.server_status(3);
        assert_eq!(status.players.online, 3);
        assert_eq!(status.version.protocol, 767);
        assert_eq!(status.description["text"], "An Andesite Server");
    }

    #[test]
    fn negative_threshold_disables_compression() {
        let config = ServerConfig {
            compression_threshold: -1,
            ..ServerConfig::default()
        };
        assert!(!config.compression_enabled());
    }
}
