//! # Verse Composer
//!
//! Command-line entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verse_cli::CliArgs;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,verse_core=debug,verse_renderer=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // RUST_LOG_FORMAT=json for machine-readable logs
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    tracing::debug!(
        "Surface {}x{}, state file {}",
        args.width,
        args.height,
        args.command.state().display()
    );

    let report = verse_cli::run(&args).await?;
    println!("{report}");
    Ok(())
}
