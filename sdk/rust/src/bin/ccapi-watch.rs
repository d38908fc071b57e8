//! Connects to a CCAPI camera and prints its shooting mode as it changes.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ccapi::ConnectorConfig;
use ccapi_sdk::CcapiSdkClient;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ccapi-watch", version, about = "Watch a Canon camera's still/video mode over CCAPI")]
struct Cli {
    /// IPv4 address of the camera
    address: String,

    /// JSON file with connector settings
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// CCAPI port, overrides the config file
    #[arg(long)]
    port: Option<u16>,

    /// Polling period in milliseconds, overrides the config file
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
}

impl Cli {
    fn connector_config(&self) -> Result<ConnectorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => ConnectorConfig::default(),
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval_ms {
            config.poll_interval_ms = interval;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let client = CcapiSdkClient::new(cli.connector_config()?)?;

    let status = match client.connect(&cli.address).await {
        Ok(status) => status,
        Err(err) => bail!("{}", err),
    };
    println!("{}", status);

    let Some(mut modes) = client.watch_mode() else {
        bail!("session vanished after connect");
    };
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = modes.changed() => {
                if changed.is_err() {
                    break;
                }
                let mode = *modes.borrow_and_update();
                println!("{} [{}]", status.model, mode);
            }
        }
    }
    client.disconnect();
    Ok(())
}
