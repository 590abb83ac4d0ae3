//! Fetch a URL with a debug dump.
//!
//! Usage: cargo run --example fetch -- http://localhost:3000/ [config.toml]

use std::path::Path;

use reqkit::config::load_config;
use reqkit::observability::{debug_hook, request_id_hook, DebugOptions};
use reqkit::{ClientConfig, Request};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "http://localhost:3000/".to_string());
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => ClientConfig::default(),
    };

    let response = config
        .to_request()
        .with(Request::new().url(url))
        .with_hook([
            request_id_hook(),
            debug_hook(DebugOptions {
                body: true,
                ..Default::default()
            }),
        ])
        .fetch_string()
        .await?;

    println!("{}", response.body());
    Ok(())
}
