use remote_trigger_protocol::{
  Action, ErrorEnvelope, RemoteError, TriggerBuildRequest, TriggerBuildResponse,
  UploadTriggerRequest, UploadTriggerResponse,
};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Connection handle to a remote trigger server.
#[derive(Debug)]
pub struct TriggerClient {
  http: Option<Client>,
  base_url: Url,
  host: String,
  port: u16,
  outdated: bool,
}

impl TriggerClient {
  /// Create a handle for the server described by `config`.
  ///
  /// No connection is opened until the first request.
  pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
    let base_url = config.base_url()?;
    let http = Client::builder().timeout(config.timeout).build()?;

    debug!(%base_url, "created remote trigger connection");
    Ok(Self {
      http: Some(http),
      base_url,
      host: config.host.clone(),
      port: config.port,
      outdated: false,
    })
  }

  pub fn host(&self) -> &str {
    &self.host
  }

  pub fn port(&self) -> u16 {
    self.port
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Whether this handle is closed or known to be unusable.
  pub fn is_outdated(&self) -> bool {
    self.outdated
  }

  /// Release the underlying connection pool.
  pub fn close(&mut self) {
    if self.http.take().is_some() {
      debug!(base_url = %self.base_url, "closed remote trigger connection");
    }
    self.outdated = true;
  }

  /// Ask trigger `trigger_name` whether a build should start.
  pub async fn send_trigger_build(
    &mut self,
    trigger_name: &str,
    request: &TriggerBuildRequest,
  ) -> Result<bool, ClientError> {
    let response = self.post(Action::TriggerBuild, trigger_name, request).await?;
    let body: TriggerBuildResponse = response.json().await?;
    Ok(body.triggered)
  }

  /// Upload the bytes of trigger `trigger_name`.
  ///
  /// Returns `true` when the server acknowledged the upload with `200 OK`.
  pub async fn upload_trigger(
    &mut self,
    trigger_name: &str,
    request: &UploadTriggerRequest,
  ) -> Result<bool, ClientError> {
    let response = self.post(Action::UploadTrigger, trigger_name, request).await?;

    let status = response.status();
    if status != StatusCode::OK {
      warn!(trigger = trigger_name, %status, "upload was not acknowledged");
      return Ok(false);
    }

    let _: UploadTriggerResponse = response.json().await?;
    Ok(true)
  }

  /// Send one request and return the response if its status is a success.
  async fn post<B: Serialize>(
    &mut self,
    action: Action,
    trigger_name: &str,
    body: &B,
  ) -> Result<Response, ClientError> {
    let http = self.http.as_ref().ok_or(ClientError::Closed)?;
    let url = action.url(&self.base_url, trigger_name);

    debug!(?action, %url, "sending request");
    let response = match http.post(url).json(body).send().await {
      Ok(response) => response,
      Err(e) => {
        if e.is_connect() || e.is_timeout() {
          self.outdated = true;
        }
        return Err(ClientError::Transport(e));
      }
    };

    if response.status().is_success() {
      Ok(response)
    } else {
      Err(remote_error(response).await)
    }
  }
}

/// Decode an error response into the matching typed error.
async fn remote_error(response: Response) -> ClientError {
  let status = response.status();
  match response.json::<ErrorEnvelope>().await {
    Ok(envelope) => ClientError::Remote(RemoteError::from(envelope)),
    Err(e) => ClientError::Remote(RemoteError::unknown_internal(format!(
      "unexpected response with status {status}: {e}"
    ))),
  }
}
