//! wayfinder CLI entry point
//!
//! Location resolution - CLI + web API

use wayfinder::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
