use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use remote_trigger_client::ClientConfig;
use remote_trigger_poller::{
  RemoteTriggerPolicy, TRIGGER_NAME_PROPERTY, TRIGGER_PATH_PROPERTY, TriggerDescriptor,
};
use remote_trigger_registry::{DefinitionLoader, FsTriggerRegistry};
use remote_trigger_server::ServerConfig;

mod console;

use console::ConsoleContext;

/// Remote Trigger - build triggers evaluated on a remote host
#[derive(Parser)]
#[command(name = "remote-trigger")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.remote-trigger)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Serve stored triggers over HTTP
  Serve {
    #[arg(long, env = "REMOTE_TRIGGER_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "REMOTE_TRIGGER_PORT", default_value_t = 8080)]
    port: u16,

    /// Where uploaded triggers are stored (default: <data-dir>/triggers)
    #[arg(long, env = "REMOTE_TRIGGER_DIR")]
    triggers_dir: Option<PathBuf>,
  },

  /// Poll a remote trigger and print the builds it requests
  Poll {
    /// Name the remote host knows the trigger by
    #[arg(long)]
    name: String,

    /// Local trigger file uploaded when the remote host lacks it
    #[arg(long)]
    path: PathBuf,

    /// Poller instance id (default: the trigger name)
    #[arg(long)]
    id: Option<String>,

    #[arg(long, env = "REMOTE_TRIGGER_HOST", default_value = "localhost")]
    host: String,

    #[arg(long, env = "REMOTE_TRIGGER_PORT", default_value_t = 8080)]
    port: u16,

    /// Trigger property forwarded to the remote trigger, as key=value
    #[arg(long = "property", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u32>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Serve {
      host,
      port,
      triggers_dir,
    }) => {
      let triggers_dir = match triggers_dir {
        Some(dir) => dir,
        None => data_dir(cli.data_dir)?.join("triggers"),
      };
      let config = ServerConfig {
        host,
        port,
        triggers_dir,
      };
      run(serve(config))
    }
    Some(Commands::Poll {
      name,
      path,
      id,
      host,
      port,
      properties,
      ticks,
    }) => {
      let mut properties: BTreeMap<String, String> = properties.into_iter().collect();
      properties.insert(TRIGGER_NAME_PROPERTY.to_string(), name.clone());
      properties.insert(
        TRIGGER_PATH_PROPERTY.to_string(),
        path.to_string_lossy().into_owned(),
      );
      let descriptor = TriggerDescriptor::from_properties(id.unwrap_or(name), &properties)?;
      let config = ClientConfig::new(host, port);
      run(poll(config, descriptor, properties, ticks))
    }
    None => {
      println!("remote-trigger - use --help to see available commands");
      Ok(())
    }
  }
}

fn data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
  match data_dir {
    Some(dir) => Ok(dir),
    None => Ok(
      dirs::home_dir()
        .context("could not determine home directory")?
        .join(".remote-trigger"),
    ),
  }
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
  let (key, value) = raw
    .split_once('=')
    .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
  Ok((key.to_string(), value.to_string()))
}

fn run(task: impl Future<Output = Result<()>>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(task)
}

/// Cancel the returned token on ctrl-c.
fn shutdown_token() -> CancellationToken {
  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("shutting down");
      on_signal.cancel();
    }
  });
  cancel
}

async fn serve(config: ServerConfig) -> Result<()> {
  tokio::fs::create_dir_all(&config.triggers_dir)
    .await
    .with_context(|| {
      format!(
        "failed to create triggers directory: {}",
        config.triggers_dir.display()
      )
    })?;

  let registry = Arc::new(FsTriggerRegistry::new(
    &config.triggers_dir,
    DefinitionLoader,
  ));
  let cancel = shutdown_token();

  remote_trigger_server::serve(&config, registry, cancel.cancelled_owned())
    .await
    .context("remote trigger server failed")
}

async fn poll(
  config: ClientConfig,
  descriptor: TriggerDescriptor,
  properties: BTreeMap<String, String>,
  max_ticks: Option<u32>,
) -> Result<()> {
  let trigger_name = descriptor.trigger_name.clone();
  let mut ctx = ConsoleContext::new(descriptor, properties);
  let policy = RemoteTriggerPolicy::new(config);
  let cancel = shutdown_token();

  policy
    .activate(&ctx)
    .await
    .context("failed to connect to remote trigger server")?;

  let mut interval = tokio::time::interval(policy.poll_interval());
  let mut previous: Option<&'static str> = None;
  let mut ticks = 0;

  loop {
    tokio::select! {
      _ = cancel.cancelled() => break,
      _ = interval.tick() => {
        let state = policy.poll(previous, &mut ctx).await;
        for reason in ctx.take_enqueued() {
          let line = serde_json::json!({
            "trigger": trigger_name,
            "reason": reason,
          });
          println!("{line}");
        }

        previous = Some(state);
        ticks += 1;
        if max_ticks.is_some_and(|max| ticks >= max) {
          break;
        }
      }
    }
  }

  policy.deactivate(&ctx).await;
  Ok(())
}
