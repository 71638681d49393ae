use std::sync::Arc;

use futures::StreamExt;

use lease_form::channels::{Channel, CliChannel, IncomingMessage, OutgoingResponse};
use lease_form::config::FormConfig;
use lease_form::form::{FormService, InMemorySessionStore, SnapshotRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = FormConfig::from_env()?;
    let overrides = config.load_overrides()?;

    eprintln!("📄 Lease Form v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Output: {}", config.output_dir.display());
    eprintln!("   Template: {}", config.templates.lease);
    if let Some(path) = &config.overrides_path {
        eprintln!(
            "   Overrides: {} ({} renames, {} skip rules)",
            path.display(),
            overrides.renames.len(),
            overrides.skip_rules.len()
        );
    }
    eprintln!("   Type /start to begin, /pick <tag> to press a button, /quit to exit.\n");

    let renderer = Arc::new(SnapshotRenderer::new(
        config.output_dir.clone(),
        config.templates.clone(),
    ));
    let store = Arc::new(InMemorySessionStore::new());
    let service = FormService::lease(overrides, renderer, store);

    let channel = CliChannel::new();
    let mut messages = channel.start().await?;
    tracing::info!("Lease form ready on channel {}", channel.name());

    loop {
        let message = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
            msg = messages.next() => match msg {
                Some(m) => m,
                None => {
                    tracing::info!("Input closed, shutting down...");
                    break;
                }
            },
        };

        handle(&service, &channel, &message).await;
        eprint!("> ");
    }

    channel.shutdown().await?;
    Ok(())
}

async fn handle(service: &FormService, channel: &dyn Channel, message: &IncomingMessage) {
    let responses = match service.handle(message).await {
        Ok(responses) => responses,
        Err(e) => {
            tracing::error!(user_id = %message.user_id, "Error handling message: {}", e);
            vec![OutgoingResponse::text(format!("Error: {e}"))]
        }
    };
    for response in responses {
        if let Err(e) = channel.respond(message, response).await {
            tracing::error!("Failed to send response: {}", e);
        }
    }
}
