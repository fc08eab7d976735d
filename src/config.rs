use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use tracing_unwrap::ResultExt;

use crate::error::{Result, ScrapeError};

/// Mod list configuration, read from a TOML file.
#[derive(Debug, Deserialize)]
pub struct ModConfig {
    pub minecraft_version: String,
    /// Bound on the CurseForge listing pagination loop. Absent means the
    /// loop keeps paging until it finds a matching file row.
    #[serde(default)]
    pub max_listing_pages: Option<NonZeroU32>,
    pub mod_list: Vec<ModListItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModListItem {
    pub id: String,
    pub repo: Repo,
    pub channel: Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repo {
    Curseforge,
    Modrinth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Alpha,
    Beta,
    Release,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Alpha => "alpha",
            Channel::Beta => "beta",
            Channel::Release => "release",
        })
    }
}

pub fn load(path: &Path) -> Result<ModConfig> {
    debug!("Reading mod config from {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| ScrapeError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: ModConfig = toml::from_str(&raw).map_err(|e| ScrapeError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate(path, &config)?;
    Ok(config)
}

fn validate(path: &Path, config: &ModConfig) -> Result<()> {
    let version_pattern =
        Regex::new(r"^\d+\.\d+\.\d+$").expect_or_log("Version pattern failed to compile");
    if !version_pattern.is_match(&config.minecraft_version) {
        return Err(ScrapeError::Config {
            path: path.to_path_buf(),
            message: format!(
                "invalid minecraft_version: {:?}",
                config.minecraft_version
            ),
        });
    }
    for (i, item) in config.mod_list.iter().enumerate() {
        if item.id.is_empty() {
            return Err(ScrapeError::Config {
                path: path.to_path_buf(),
                message: format!("invalid mod_list[{i}].id: must not be empty"),
            });
        }
    }
    Ok(())
}
