//! Configuration for OpenShowVar
//!
//! Centralized configuration with sensible defaults. Values can come from a
//! TOML file, a builder, or both (builder calls override the file).
//!
//! ```toml
//! host = "172.31.1.147"
//! port = 7000
//! read_timeout_ms = 5000
//! text_encoding = "ascii"
//!
//! [[watch]]
//! name = "ADAPTLASERPOWER2"
//! interval_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OsvError, Result};

/// Main configuration for a controller session and the shell around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Controller host name or IP address
    pub host: String,

    /// Controller TCP port
    pub port: u16,

    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Reply timeout (milliseconds, 0 blocks indefinitely)
    pub read_timeout_ms: u64,

    /// Send timeout (milliseconds, 0 blocks indefinitely)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Fixed first sequence id. `None` picks a random id in 1..=100.
    pub initial_sequence_id: Option<u16>,

    /// Which characters names and values may contain
    pub text_encoding: TextEncoding,

    // -------------------------------------------------------------------------
    // Shell / Scheduler Configuration
    // -------------------------------------------------------------------------
    /// Variable read by keep-alive cycles
    pub heartbeat_var: String,

    /// Keep-alive period (seconds)
    pub keep_alive_interval_secs: u64,

    /// Variable read once after connecting, shown as the controller identity
    pub identity_var: String,

    /// Variables polled periodically and written to the value log
    pub watch: Vec<WatchVar>,

    /// Log of read/written values
    pub value_log: PathBuf,

    /// Log of connection events (connect, keep-alive, disconnect)
    pub connection_log: PathBuf,
}

/// A variable polled on a fixed interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchVar {
    pub name: String,
    pub interval_secs: u64,
}

/// Text policy for variable names and values.
///
/// The protocol carries raw bytes and declares no charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Any UTF-8 text, sent as its UTF-8 bytes
    #[default]
    Utf8,

    /// 7-bit ASCII only; anything else is rejected before sending
    Ascii,
}

impl TextEncoding {
    /// Validate outgoing text and return its wire bytes
    pub fn encode(&self, field: &str, text: &str) -> Result<Vec<u8>> {
        if text.is_empty() {
            return Err(OsvError::InvalidInput(format!("{} must not be empty", field)));
        }
        if *self == TextEncoding::Ascii && !text.is_ascii() {
            return Err(OsvError::InvalidInput(format!(
                "{} contains non-ASCII characters: {:?}",
                field, text
            )));
        }
        Ok(text.as_bytes().to_vec())
    }

    /// Interpret reply bytes as text
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Ascii if !bytes.is_ascii() => Err(OsvError::Encoding(format!(
                "reply contains non-ASCII bytes: {:02x?}",
                bytes
            ))),
            _ => String::from_utf8(bytes.to_vec())
                .map_err(|e| OsvError::Encoding(format!("reply is not valid UTF-8: {}", e))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "172.31.1.147".to_string(),
            port: 7000,
            connect_timeout_ms: 3000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            initial_sequence_id: None,
            text_encoding: TextEncoding::Utf8,
            heartbeat_var: "$OV_PRO".to_string(),
            keep_alive_interval_secs: 25,
            identity_var: "$ROBNAME[]".to_string(),
            watch: Vec::new(),
            value_log: PathBuf::from("osv_values.log"),
            connection_log: PathBuf::from("osv_connection.log"),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a config from TOML text; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OsvError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check values that would only fail later, at connect or schedule time
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(OsvError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(OsvError::Config("port must not be 0".to_string()));
        }
        if self.heartbeat_var.is_empty() {
            return Err(OsvError::Config("heartbeat_var must not be empty".to_string()));
        }
        if self.keep_alive_interval_secs == 0 {
            return Err(OsvError::Config(
                "keep_alive_interval_secs must be positive".to_string(),
            ));
        }
        for var in &self.watch {
            if var.name.is_empty() || var.interval_secs == 0 {
                return Err(OsvError::Config(format!(
                    "invalid watch entry {:?}: needs a name and a positive interval",
                    var
                )));
            }
        }
        Ok(())
    }

    /// `host:port` of the controller
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Reply timeout, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Send timeout, `None` when disabled
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_interval_secs)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from an existing config (e.g. one loaded from a file)
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the controller host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the controller port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the reply timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the send timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Pin the first sequence id
    pub fn initial_sequence_id(mut self, id: u16) -> Self {
        self.config.initial_sequence_id = Some(id);
        self
    }

    /// Set the text policy
    pub fn text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.config.text_encoding = encoding;
        self
    }

    /// Set the keep-alive variable
    pub fn heartbeat_var(mut self, name: impl Into<String>) -> Self {
        self.config.heartbeat_var = name.into();
        self
    }

    /// Set the keep-alive period (in seconds)
    pub fn keep_alive_interval_secs(mut self, secs: u64) -> Self {
        self.config.keep_alive_interval_secs = secs;
        self
    }

    /// Set the identity variable
    pub fn identity_var(mut self, name: impl Into<String>) -> Self {
        self.config.identity_var = name.into();
        self
    }

    /// Add a polled variable
    pub fn watch(mut self, name: impl Into<String>, interval_secs: u64) -> Self {
        self.config.watch.push(WatchVar {
            name: name.into(),
            interval_secs,
        });
        self
    }

    /// Set both log file paths
    pub fn log_paths(mut self, values: impl Into<PathBuf>, connection: impl Into<PathBuf>) -> Self {
        self.config.value_log = values.into();
        self.config.connection_log = connection.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
