use crate::sim::Spin;
use anyhow::{bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

const MAX_PARTICLES: usize = 50_000;

#[derive(Parser, Debug, Clone)]
#[command(name = "xmastree")]
#[command(about = "Particle Christmas tree that assembles around a generated blessing")]
pub(crate) struct Cli {
    /// Particles shared by tree, star and ripples
    #[arg(long, default_value_t = 4500)]
    particles: usize,

    /// Frame cap (clamped to 10..=240)
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// RNG seed for the scene (default: clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Force monochrome (no colors)
    #[arg(long, default_value_t = false)]
    mono: bool,

    /// Spin by elapsed time instead of a fixed step per frame
    #[arg(long, default_value_t = false)]
    time_scaled: bool,

    /// Gemini API key (falls back to $API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for the blessing
    #[arg(long, default_value = "gemini-3-flash-preview")]
    model: String,

    /// Base URL of the generative language API
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    api_base: String,

    /// Give up on the blessing request after this many seconds
    #[arg(long, default_value_t = 20)]
    timeout_secs: u64,

    /// Where log records go (default: the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) struct ServiceConfig {
    pub(crate) api_key: Option<String>,
    pub(crate) api_base: String,
    pub(crate) model: String,
    pub(crate) timeout: Duration,
}

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) particles: usize,
    pub(crate) frame_dt: Duration,
    pub(crate) seed: u64,
    pub(crate) mono: bool,
    pub(crate) spin: Spin,
    pub(crate) service: ServiceConfig,
    pub(crate) log_file: PathBuf,
}

impl Config {
    pub(crate) fn from_cli(cli: Cli) -> Result<Self> {
        if cli.particles > MAX_PARTICLES {
            bail!("--particles must be at most {MAX_PARTICLES}");
        }
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs must be positive");
        }
        let fps = cli.fps.clamp(10, 240);
        let seed = cli.seed.unwrap_or_else(clock_seed);
        let api_key = cli
            .api_key
            .or_else(|| std::env::var("API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let log_file = match cli.log_file {
            Some(p) => p,
            None => default_log_file(),
        };

        Ok(Self {
            particles: cli.particles,
            frame_dt: Duration::from_secs_f32(1.0 / fps as f32),
            seed,
            mono: cli.mono,
            spin: if cli.time_scaled {
                Spin::TimeScaled
            } else {
                Spin::PerFrame
            },
            service: ServiceConfig {
                api_key,
                api_base: cli.api_base,
                model: cli.model,
                timeout: Duration::from_secs(cli.timeout_secs),
            },
            log_file,
        })
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0xC0FFEE)
}

fn default_log_file() -> PathBuf {
    let dir = ProjectDirs::from("com", "xmastree", "xmastree")
        .map(|p| p.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    dir.join("xmastree.log")
}

/// Logs go to a file; stdout belongs to the UI.
pub(crate) fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
