use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::http::parser::{ParserOptions, UnframedBodyPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,

    /// Initial read buffer size, doubled whenever a line does not fit.
    pub buffer_size: usize,
    pub max_buffer_size: usize,
    pub max_body_size: usize,

    pub unframed_body: UnframedBodyPolicy,
    pub chunked_requests: bool,

    pub server_name: String,
    /// Directory behind `/video` and `/static/<path>`.
    pub static_files_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 42069,

            buffer_size: 1024,
            max_buffer_size: 64 * 1024,
            max_body_size: 1024 * 1024, // 1 MB

            unframed_body: UnframedBodyPolicy::Discard,
            chunked_requests: true,

            server_name: "rustynet/0.2".to_string(),
            static_files_root: PathBuf::from("./assets"),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ServerConfig>(content)
    }

    pub fn from_file(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "fail to read config, falling back to defaults");
                return ServerConfig::default();
            }
        };

        match Self::from_toml(&content) {
            Ok(server_config) => server_config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "fail to deserialize config, falling back to defaults");
                ServerConfig::default()
            }
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            buffer_size: self.buffer_size,
            max_buffer_size: self.max_buffer_size,
            max_body_size: self.max_body_size,
            unframed_body: self.unframed_body,
            chunked_requests: self.chunked_requests,
        }
    }
}
