mod cli;
mod error;
mod progress;

use crate::{cli::Args, error::Result, progress::ProgressRenderer};
use clap::Parser;
use restitch_engine::Downloader;
use std::process;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let renderer = ProgressRenderer::new();
    let hook = (!args.quiet).then(|| renderer.hook());

    let downloader = Downloader::new(
        args.session_config(hook),
        args.fetch_config(),
        args.merge_config(),
    )?;
    let outcome = downloader.run(&args.input).await?;

    // The merged path on stdout, for scripting; everything else goes
    // through tracing on stderr.
    println!("{}", outcome.output.display());
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    subscriber
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
    Ok(())
}
