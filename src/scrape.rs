use colored::Colorize;
use tracing::info;

use crate::browser::{self, BrowserSession};
use crate::classify::{self, DownloadRecord};
use crate::config::{ModConfig, ModListItem};
use crate::error::Result;
use crate::layout::DownloadDirs;

/// Runs every configured mod through the download cycle, strictly in
/// configuration order. The first failure aborts the whole run; artifacts
/// already filed stay where they are.
pub async fn download_all(
    session: &BrowserSession,
    config: &ModConfig,
    dirs: &DownloadDirs,
) -> Result<()> {
    let total = config.mod_list.len();
    for (index, item) in config.mod_list.iter().enumerate() {
        println!(
            "Downloading mod {}/{}",
            (index + 1).to_string().bold(),
            total.to_string().bold()
        );
        download_one(session, config, dirs, item).await?;
    }
    Ok(())
}

/// Navigate -> locate -> trigger -> await completion -> hand off. Each
/// item's artifact is moved out of scratch before the next item starts,
/// so the scratch directory never holds more than one file.
async fn download_one(
    session: &BrowserSession,
    config: &ModConfig,
    dirs: &DownloadDirs,
    item: &ModListItem,
) -> Result<()> {
    let adapter = item.repo.adapter();

    let url = adapter.listing_url(item, &config.minecraft_version);
    info!("Going to {url}");
    session.goto(url.as_str()).await?;

    let trigger = adapter
        .locate_download_trigger(session, item, config.max_listing_pages)
        .await?;

    let display_name = adapter.display_name(session).await?;
    let realm = adapter.resolve_realm(session).await?;
    info!("Mod name: {display_name}");
    info!("Mod realm: {realm}");

    // Subscribe before triggering so the terminal event cannot be missed.
    let events = session.download_events().await?;
    adapter.trigger_download(session, item, &trigger).await?;
    info!("Waiting for download to complete...");
    browser::await_terminal(events, &item.id).await?;

    let file_name = dirs.scratch_file_name().await?;
    info!("Downloaded file: {file_name}");
    classify::place(
        dirs,
        item.repo,
        DownloadRecord {
            file_name,
            display_name,
            realm,
        },
    )
    .await
}
