use clap::Parser;
use tracing_subscriber::EnvFilter;

use teleop_bridge::config::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    if let Err(e) = teleop_bridge::bridge::run(&args).await {
        eprintln!("Bridge error: {}", e);
        std::process::exit(1);
    }
}
