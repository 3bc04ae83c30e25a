use std::future::Future;
use std::sync::Arc;

use remote_trigger_registry::TriggerRegistry;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::router::build_router;
use crate::state::AppState;

/// Bind `config.host:config.port` and serve until `shutdown` resolves.
pub async fn serve(
  config: &ServerConfig,
  registry: Arc<dyn TriggerRegistry>,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
  let address = config.bind_address();
  let listener = TcpListener::bind(&address)
    .await
    .map_err(|source| ServerError::Bind { address, source })?;

  serve_listener(listener, registry, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_listener(
  listener: TcpListener,
  registry: Arc<dyn TriggerRegistry>,
  shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
  let address = listener.local_addr()?;
  info!(%address, "remote trigger server listening");

  let router = build_router(AppState::new(registry));
  axum::serve(listener, router)
    .with_graceful_shutdown(shutdown)
    .await?;

  info!("remote trigger server stopped");
  Ok(())
}
