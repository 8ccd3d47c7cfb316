mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use fishon_core::FishOnContext;

use crate::cli::Cli;
use crate::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        log::debug!("command failed: {:?}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config()?;
    let ctx = FishOnContext::builder().config(config).build()?;

    match ctx.initialize().await.identity() {
        Some(user) => log::info!("Signed in as {}", user.display_name()),
        None => log::info!("Not signed in"),
    }

    let output = commands::dispatch(&ctx, cli.command).await;
    ctx.dispose();

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}
