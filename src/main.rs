mod browser;
mod classify;
mod config;
mod error;
mod layout;
mod link;
mod scrape;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::info;

use crate::error::Result;

/// Downloads a curated list of Minecraft mods through a real browser and
/// links the server-relevant ones into a live server mod folder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to mod list config
    #[arg(short, long)]
    config: PathBuf,

    /// Path to save the downloaded mod files
    #[arg(short, long)]
    download_dir: PathBuf,

    /// Minecraft server mod folder
    #[arg(short, long)]
    mod_dir: PathBuf,

    /// Allows you to see what the scraper is doing
    #[arg(long)]
    not_headless: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    info!(
        "Starting mcmodscraper version {}",
        env!("CARGO_PKG_VERSION")
    );
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let dirs = layout::DownloadDirs::prepare(&args.download_dir).await?;
    let mod_config = config::load(&args.config)?;

    let session = browser::BrowserSession::launch(!args.not_headless, dirs.scratch()).await?;
    let downloads = scrape::download_all(&session, &mod_config, &dirs).await;
    // The browser is shut down whether the downloads succeeded or not.
    let shutdown = session.close().await;
    downloads?;
    shutdown?;

    dirs.remove_scratch().await?;
    println!("{}", "Mod downloads completed!".green());

    let linked = link::relink_server_mods(&args.mod_dir, &dirs)?;
    println!(
        "{} mods linked into the server mod folder!",
        linked.to_string().bold()
    );
    println!("Everything seems to be done!");
    Ok(())
}
