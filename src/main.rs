mod app;
mod blessing;
mod config;
mod input;
mod mode;
mod particle;
mod render;
mod scene;
mod sim;
mod text;
mod ui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::Config::from_cli(config::Cli::parse())?;
    config::init_logging(&cfg.log_file)?;
    log::info!(
        "starting: {} particles, {:?} per frame, seed {}, spin {:?}, api key {}",
        cfg.particles,
        cfg.frame_dt,
        cfg.seed,
        cfg.spin,
        if cfg.service.api_key.is_some() { "set" } else { "missing" }
    );

    let result = app::run(cfg).await;
    if let Err(e) = &result {
        log::error!("{e:#}");
    }
    result
}
