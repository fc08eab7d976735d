use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing_unwrap::ResultExt;
use url::Url;

use crate::browser::BrowserSession;
use crate::classify::Realm;
use crate::config::{ModListItem, Repo};
use crate::error::{Result, ScrapeError};

const SELECTOR_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SETTLE_DELAY: Duration = Duration::from_millis(813);
const MENU_OPEN_DELAY: Duration = Duration::from_millis(123);

/// One hosting site's way of getting from a mod id to a started download.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Listing page URL for the mod, pre-filtered as far as the site
    /// supports.
    fn listing_url(&self, item: &ModListItem, minecraft_version: &str) -> Url;

    /// Finds the element that starts the download for the configured
    /// channel and returns its selector. On CurseForge this pages through
    /// the listing until a matching file row shows up.
    async fn locate_download_trigger(
        &self,
        session: &BrowserSession,
        item: &ModListItem,
        max_pages: Option<NonZeroU32>,
    ) -> Result<String>;

    async fn display_name(&self, session: &BrowserSession) -> Result<String>;

    async fn resolve_realm(&self, session: &BrowserSession) -> Result<Realm>;

    /// Performs the UI sequence that starts the browser-level download.
    async fn trigger_download(
        &self,
        session: &BrowserSession,
        item: &ModListItem,
        trigger: &str,
    ) -> Result<()>;
}

impl Repo {
    pub fn adapter(&self) -> &'static dyn SourceAdapter {
        match self {
            Repo::Curseforge => &CurseForge,
            Repo::Modrinth => &Modrinth,
        }
    }
}

pub struct CurseForge;

impl CurseForge {
    fn any_row_selector(item: &ModListItem) -> String {
        format!(r#"a[href^="/minecraft/mc-mods/{}/download/"]"#, item.id)
    }

    fn channel_row_selector(item: &ModListItem) -> String {
        format!(
            "{}:is(.file-row:has(.channel-tag.{}) a)",
            Self::any_row_selector(item),
            item.channel
        )
    }

    fn menu_button_selector(item: &ModListItem) -> String {
        format!(
            ".kebab-menu button:is(.file-row:has(.channel-tag.{}) button)",
            item.channel
        )
    }
}

#[async_trait]
impl SourceAdapter for CurseForge {
    fn listing_url(&self, item: &ModListItem, minecraft_version: &str) -> Url {
        let mut url = Url::parse("https://www.curseforge.com/minecraft/mc-mods/")
            .expect_or_log("CurseForge base URL failed to parse")
            .join(&format!("{}/files/all", item.id))
            .expect_or_log("Mod id does not form a valid URL path");
        url.query_pairs_mut()
            .append_pair("page", "1") // the listing does not default to page 1
            .append_pair("pageSize", "50")
            .append_pair("gameVersionTypeId", "4") // fabric
            .append_pair("version", minecraft_version);
        url
    }

    async fn locate_download_trigger(
        &self,
        session: &BrowserSession,
        item: &ModListItem,
        max_pages: Option<NonZeroU32>,
    ) -> Result<String> {
        let any_row = Self::any_row_selector(item);
        let channel_row = Self::channel_row_selector(item);
        let mut pages_checked = 0u32;
        loop {
            session.wait_for_element(&any_row, SELECTOR_TIMEOUT).await?;
            if session.try_find(&channel_row).await.is_some() {
                return Ok(channel_row);
            }
            pages_checked += 1;
            if let Some(limit) = max_pages {
                if pages_checked >= limit.get() {
                    return Err(ScrapeError::AssetNotFound {
                        id: item.id.clone(),
                        channel: item.channel,
                        pages: pages_checked,
                    });
                }
            }
            info!("`{channel_row}` not found, going to the next page...");
            session.click("button.btn-single-icon.btn-next").await?;
            tokio::time::sleep(PAGE_SETTLE_DELAY).await;
        }
    }

    async fn display_name(&self, session: &BrowserSession) -> Result<String> {
        session
            .element_text(".project-header > .name-container > h1")
            .await
    }

    async fn resolve_realm(&self, _session: &BrowserSession) -> Result<Realm> {
        // File listings carry no environment tags.
        Ok(Realm::Both)
    }

    async fn trigger_download(
        &self,
        session: &BrowserSession,
        item: &ModListItem,
        trigger: &str,
    ) -> Result<()> {
        // The asset link only becomes clickable once the row's kebab menu
        // is open.
        session.click(&Self::menu_button_selector(item)).await?;
        tokio::time::sleep(MENU_OPEN_DELAY).await;
        session.click(trigger).await?;
        Ok(())
    }
}

pub struct Modrinth;

const MODRINTH_DOWNLOAD_SELECTOR: &str =
    r#"a[href^="https://cdn.modrinth.com/data/"][aria-label="Download"]"#;

#[async_trait]
impl SourceAdapter for Modrinth {
    fn listing_url(&self, item: &ModListItem, minecraft_version: &str) -> Url {
        let mut url = Url::parse("https://modrinth.com/mod/")
            .expect_or_log("Modrinth base URL failed to parse")
            .join(&format!("{}/versions", item.id))
            .expect_or_log("Mod id does not form a valid URL path");
        url.query_pairs_mut()
            .append_pair("l", "fabric")
            .append_pair("g", minecraft_version)
            .append_pair("c", &item.channel.to_string());
        url
    }

    async fn locate_download_trigger(
        &self,
        session: &BrowserSession,
        _item: &ModListItem,
        _max_pages: Option<NonZeroU32>,
    ) -> Result<String> {
        // The listing endpoint is already filtered down to the requested
        // channel, so the first download anchor is the right one.
        session
            .wait_for_element(MODRINTH_DOWNLOAD_SELECTOR, SELECTOR_TIMEOUT)
            .await?;
        Ok(MODRINTH_DOWNLOAD_SELECTOR.to_string())
    }

    async fn display_name(&self, session: &BrowserSession) -> Result<String> {
        session.element_text("h1").await
    }

    async fn resolve_realm(&self, session: &BrowserSession) -> Result<Realm> {
        let text = session
            .element_text("section:last-child > h3 + div.tag-list")
            .await?;
        Ok(Realm::from_tag_text(&text))
    }

    async fn trigger_download(
        &self,
        session: &BrowserSession,
        _item: &ModListItem,
        trigger: &str,
    ) -> Result<()> {
        session.click(trigger).await
    }
}
