use anyhow::Context;

use sse_relay_client::{channel, Client, Options};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::args();

    let source = match args.source {
        Some(source) => source,
        None => {
            let source = channel::create_channel()
                .await
                .context("failed to provision a relay channel")?;
            println!("✅ provisioned relay channel: {source}");
            source
        }
    };

    let client = Client::new(Options {
        source,
        target: args.target,
        logger: None,
    })
    .context("failed to build relay client")?;

    client.start().await?;

    Ok(())
}
