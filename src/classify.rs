use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::Repo;
use crate::error::Result;
use crate::layout::{DownloadDirs, SIDECAR_SUFFIX};

/// The environment a mod build is meant to run in, as advertised by its
/// listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    Client,
    Server,
    Both,
    Unknown,
}

impl Realm {
    /// Parses Modrinth's environment tag panel. The panel text names
    /// client-side and/or server-side support, or a combined
    /// "client and server" token.
    pub fn from_tag_text(text: &str) -> Realm {
        let text = text.to_lowercase();
        if text.contains("client and server") {
            Realm::Both
        } else if text.contains("server-side") {
            if text.contains("client-side") {
                Realm::Both
            } else {
                Realm::Server
            }
        } else if text.contains("client-side") {
            Realm::Client
        } else {
            Realm::Unknown
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Realm::Client => "client",
            Realm::Server => "server",
            Realm::Both => "both",
            Realm::Unknown => "unknown - assuming both",
        })
    }
}

/// The bucket directory an artifact is filed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Server,
    Shared,
    Client,
}

/// A completed browser download, ready to be filed.
#[derive(Debug)]
pub struct DownloadRecord {
    /// File name the browser saved the artifact under, relative to scratch.
    pub file_name: String,
    /// Mod name as shown on the listing page.
    pub display_name: String,
    pub realm: Realm,
}

/// CurseForge listings carry no realm signal, so everything from there
/// lands in the shared bucket. Modrinth artifacts are filed by realm,
/// with Unknown treated as shared.
pub fn bucket_for(repo: Repo, realm: Realm) -> Bucket {
    match (repo, realm) {
        (Repo::Curseforge, _) => Bucket::Shared,
        (Repo::Modrinth, Realm::Server) => Bucket::Server,
        (Repo::Modrinth, Realm::Client) => Bucket::Client,
        (Repo::Modrinth, Realm::Both | Realm::Unknown) => Bucket::Shared,
    }
}

/// Moves the artifact out of scratch into its bucket and writes the
/// `.name.txt` sidecar next to it.
pub async fn place(dirs: &DownloadDirs, repo: Repo, record: DownloadRecord) -> Result<()> {
    let bucket_dir = match bucket_for(repo, record.realm) {
        Bucket::Server => dirs.server(),
        Bucket::Shared => dirs.shared(),
        Bucket::Client => dirs.client(),
    };
    let artifact = bucket_dir.join(&record.file_name);
    debug!("Filing {} into {}", record.file_name, bucket_dir.display());
    tokio::fs::rename(dirs.scratch().join(&record.file_name), &artifact).await?;
    write_sidecar(&artifact, &record.display_name).await?;
    Ok(())
}

async fn write_sidecar(artifact: &Path, display_name: &str) -> Result<()> {
    let mut sidecar = artifact.as_os_str().to_owned();
    sidecar.push(SIDECAR_SUFFIX);
    tokio::fs::write(sidecar, format!("{display_name}\n")).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_text_naming_both_sides_is_both() {
        assert_eq!(
            Realm::from_tag_text("Client-side\nServer-side"),
            Realm::Both
        );
        assert_eq!(Realm::from_tag_text("Client and server"), Realm::Both);
    }

    #[test]
    fn tag_text_naming_one_side_is_that_side() {
        assert_eq!(Realm::from_tag_text("Server-side"), Realm::Server);
        assert_eq!(Realm::from_tag_text("Client-side"), Realm::Client);
    }

    #[test]
    fn tag_text_naming_neither_side_is_unknown() {
        assert_eq!(Realm::from_tag_text("Utility\nFabric"), Realm::Unknown);
    }

    #[test]
    fn curseforge_is_always_shared() {
        for realm in [Realm::Client, Realm::Server, Realm::Both, Realm::Unknown] {
            assert_eq!(bucket_for(Repo::Curseforge, realm), Bucket::Shared);
        }
    }

    #[test]
    fn modrinth_is_filed_by_realm() {
        assert_eq!(bucket_for(Repo::Modrinth, Realm::Server), Bucket::Server);
        assert_eq!(bucket_for(Repo::Modrinth, Realm::Client), Bucket::Client);
        assert_eq!(bucket_for(Repo::Modrinth, Realm::Both), Bucket::Shared);
        assert_eq!(bucket_for(Repo::Modrinth, Realm::Unknown), Bucket::Shared);
    }

    #[tokio::test]
    async fn place_moves_the_artifact_and_writes_its_sidecar() {
        let base = tempfile::tempdir().unwrap();
        let dirs = crate::layout::DownloadDirs::prepare(base.path())
            .await
            .unwrap();
        std::fs::write(dirs.scratch().join("lithium-0.12.jar"), b"jar").unwrap();

        place(
            &dirs,
            Repo::Modrinth,
            DownloadRecord {
                file_name: "lithium-0.12.jar".into(),
                display_name: "Lithium".into(),
                realm: Realm::Server,
            },
        )
        .await
        .unwrap();

        assert!(dirs.server().join("lithium-0.12.jar").is_file());
        let sidecar = dirs.server().join("lithium-0.12.jar.name.txt");
        assert_eq!(std::fs::read_to_string(sidecar).unwrap(), "Lithium\n");
        assert_eq!(std::fs::read_dir(dirs.scratch()).unwrap().count(), 0);
    }
}
