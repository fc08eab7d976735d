use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::layout::{DownloadDirs, SIDECAR_SUFFIX};

/// Recreates the live server mod folder as links into the server-only and
/// shared buckets. Sidecar files are skipped; artifact names are assumed
/// unique across the two buckets.
pub fn relink_server_mods(mod_dir: &Path, dirs: &DownloadDirs) -> Result<usize> {
    info!("Rebuilding server mod folder {}", mod_dir.display());
    match fs::remove_dir_all(mod_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(mod_dir)?;

    let mut linked = 0;
    for bucket in [dirs.server(), dirs.shared()] {
        for entry in bucket.read_dir()? {
            let entry = entry?;
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(SIDECAR_SUFFIX)
            {
                continue;
            }
            let target = mod_dir.join(entry.file_name());
            debug!("Linking {} -> {}", target.display(), entry.path().display());
            link_file(&entry.path(), &target)?;
            linked += 1;
        }
    }
    Ok(linked)
}

#[cfg(unix)]
fn link_file(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

// Symlinks need elevated privileges on Windows; hard links do the same
// job for regular files.
#[cfg(windows)]
fn link_file(source: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::hard_link(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DownloadDirs;

    async fn seeded_dirs(base: &Path) -> DownloadDirs {
        let dirs = DownloadDirs::prepare(base).await.unwrap();
        std::fs::write(dirs.server().join("a.jar"), b"a").unwrap();
        std::fs::write(dirs.server().join("a.jar.name.txt"), b"A\n").unwrap();
        std::fs::write(dirs.shared().join("b.jar"), b"b").unwrap();
        std::fs::write(dirs.shared().join("b.jar.name.txt"), b"B\n").unwrap();
        std::fs::write(dirs.client().join("c.jar"), b"c").unwrap();
        dirs
    }

    #[tokio::test]
    async fn links_server_and_shared_artifacts_only() {
        let base = tempfile::tempdir().unwrap();
        let dirs = seeded_dirs(base.path()).await;
        let mod_dir = base.path().join("mods");

        let linked = relink_server_mods(&mod_dir, &dirs).unwrap();
        assert_eq!(linked, 2);

        let mut names: Vec<_> = mod_dir
            .read_dir()
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["a.jar", "b.jar"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn entries_are_links_into_the_buckets() {
        let base = tempfile::tempdir().unwrap();
        let dirs = seeded_dirs(base.path()).await;
        let mod_dir = base.path().join("mods");

        relink_server_mods(&mod_dir, &dirs).unwrap();
        let link = mod_dir.join("a.jar");
        assert!(link.symlink_metadata().unwrap().is_symlink());
        assert_eq!(std::fs::read(link).unwrap(), b"a");
    }

    #[tokio::test]
    async fn relinking_replaces_whatever_was_there_before() {
        let base = tempfile::tempdir().unwrap();
        let dirs = seeded_dirs(base.path()).await;
        let mod_dir = base.path().join("mods");
        std::fs::create_dir_all(&mod_dir).unwrap();
        std::fs::write(mod_dir.join("stale.jar"), b"stale").unwrap();

        relink_server_mods(&mod_dir, &dirs).unwrap();
        assert!(!mod_dir.join("stale.jar").exists());
        assert!(mod_dir.join("a.jar").exists());
    }
}
