use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::Channel;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("{}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("failed to navigate to {url}")]
    Navigation {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("no {channel} build of {id} found within {pages} listing pages")]
    AssetNotFound {
        id: String,
        channel: Channel,
        pages: u32,
    },

    #[error("browser canceled the download for {id}")]
    DownloadCanceled { id: String },

    #[error("download event stream closed before the download finished")]
    DownloadEventsClosed,

    #[error("expected exactly one file in {}, found {found}", dir.display())]
    ScratchState { dir: PathBuf, found: usize },

    #[error("element `{selector}` has no text content")]
    MissingText { selector: String },

    #[error("failed to set up browser: {0}")]
    BrowserSetup(String),

    #[error(transparent)]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
