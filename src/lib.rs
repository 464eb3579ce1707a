mod cli;
mod commands;
pub mod db;
pub mod manifest;
pub mod navigation;
pub mod page;
pub mod settings;
pub mod toc;
mod utils;

pub use utils::{escape_html, format_filename};

use anyhow::Context;
use clap::Parser;

/// Entry point for the `thesis-site` binary.
pub fn run() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();

    // Single-threaded: work only suspends while a manifest or content
    // file is being read.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(commands::dispatch(cli))
}
