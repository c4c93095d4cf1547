//! Blueprint CLI entry point.

use clap::Parser;

use blueprint::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = blueprint::cli::execute(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
