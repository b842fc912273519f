#![cfg(not(tarpaulin_include))]

use chemviz::config::{API_BASE_URL_ENV, DEFAULT_API_BASE_URL, TIMEOUT_ENV};
use chemviz::{cli, ApiClient, ClientConfig, Controller, DownloadDirHost};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/// Console client for the Chemical Visualizer backend
#[derive(Debug, Parser)]
#[command(name = "chemviz", version)]
struct Args {
    /// Backend base URL
    #[arg(long, env = API_BASE_URL_ENV, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = TIMEOUT_ENV, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Directory downloaded reports are written to
    #[arg(long, default_value = ".")]
    download_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = ClientConfig::new(&args.api_base_url)?.with_timeout(Duration::from_secs(args.timeout));
    info!("using backend at {}", config.api_base_url());

    let api = ApiClient::from_config(config)?;
    let mut controller = Controller::new(api, DownloadDirHost::new(args.download_dir));

    println!("Chemical Visualizer (type `help` for commands)");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    cli::run(&mut controller, stdin, &mut stdout).await?;

    Ok(())
}
