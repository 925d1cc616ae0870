//! DocSeq Service Entry Point
//!
//! This is the main entry point for the docseq service.
//! It initializes configuration, storage, services, and starts the HTTP server.

use docseq::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
