use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  /// Interface to bind.
  pub host: String,
  /// Port to bind.
  pub port: u16,
  /// Directory holding uploaded triggers.
  pub triggers_dir: PathBuf,
}

impl ServerConfig {
  /// `host:port` address to bind.
  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: "127.0.0.1".to_string(),
      port: 8080,
      triggers_dir: PathBuf::from("triggers"),
    }
  }
}
