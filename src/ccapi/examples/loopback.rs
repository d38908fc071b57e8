use std::sync::Arc;
use std::time::Duration;

use ccapi::{
    ApiVersion, CameraMonitor, ConnectorConfig, EndpointGroup, LoopbackCamera, Reply,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("ccapi=debug"))
        .init();

    // Replace LoopbackCamera with HttpCcapiClient::new(8080) to talk to a real camera.
    let camera = Arc::new(LoopbackCamera::standard("192.168.1.20", "Canon EOS R6"));
    let config = ConnectorConfig {
        poll_interval_ms: 500,
        ..ConnectorConfig::default()
    };
    let monitor = CameraMonitor::new(camera.clone(), config)?;

    let session = monitor.submit("192.168.1.20").await?;
    println!("connected: {} [{}]", session.device_model(), session.mode());

    let polling = ApiVersion::from("ver100");
    camera.push_reply(
        &polling,
        EndpointGroup::Polling,
        Reply::payload(json!({"moviemode": {"status": "on"}})),
    );
    let mut modes = session.subscribe();
    tokio::time::timeout(Duration::from_secs(2), modes.changed()).await??;
    println!("mode switched: {}", *modes.borrow());

    monitor.clear();
    Ok(())
}
