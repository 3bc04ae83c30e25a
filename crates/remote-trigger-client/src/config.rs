use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Where and how to reach the remote trigger server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
  pub host: String,
  pub port: u16,
  /// Timeout for a whole request, connect included.
  pub timeout: Duration,
}

impl ClientConfig {
  pub fn new(host: impl Into<String>, port: u16) -> Self {
    Self {
      host: host.into(),
      port,
      ..Self::default()
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Base URL all action URLs are built from.
  pub fn base_url(&self) -> Result<Url, ClientError> {
    let raw = format!("http://{}:{}/", self.host, self.port);
    Url::parse(&raw).map_err(|source| ClientError::InvalidAddress { address: raw, source })
  }
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      host: "localhost".to_string(),
      port: 8080,
      timeout: Duration::from_secs(30),
    }
  }
}
