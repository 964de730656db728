//! Connects to a running backend, prints its log-style events and
//! connectivity changes, and asks it for some basic information.
//!
//! ```text
//! RUST_LOG=debug cargo run -p event-monitor -- ws://localhost:20808/ws
//! ```

use deltarpc::prelude::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Event printing
// ---------------------------------------------------------------------------

/// Kinds whose `field2` carries a human-readable log line.
const LOG_KINDS: [EventKind; 4] = [
    EventKind::Info,
    EventKind::Warning,
    EventKind::Error,
    EventKind::ErrorSelfNotInGroup,
];

fn print_log_event(event: &Event) {
    let text = event.field2.as_str().unwrap_or_default();
    match event.kind {
        EventKind::Info => {
            tracing::info!(account = event.context_id, "{text}");
        }
        EventKind::Warning => {
            tracing::warn!(account = event.context_id, "{text}");
        }
        _ => {
            tracing::error!(account = event.context_id, event = event.name(), "{text}");
        }
    }
}

fn subscribe(client: &Client) {
    for kind in LOG_KINDS {
        client.on_global(kind, print_log_event);
    }
    client.on_global(EventKind::ConnectivityChanged, |event| {
        tracing::info!(account = event.context_id, "connectivity changed");
    });
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| deltarpc::DEFAULT_URL.to_string());
    let client = Client::new(url);
    subscribe(&client);

    let mut changes = client.connection_changes();
    tokio::spawn(async move {
        while let Ok(state) = changes.recv().await {
            tracing::info!(%state, "lifecycle");
        }
    });

    client.connect().await?;

    let info: Value = client.request("get_system_info", ()).await?;
    tracing::info!(%info, "system info");
    let accounts: Vec<u32> = client.request("get_all_account_ids", ()).await?;
    tracing::info!(?accounts, "accounts");

    tokio::signal::ctrl_c().await?;
    client.close().await;
    Ok(())
}
