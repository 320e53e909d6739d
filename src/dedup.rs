//! "Already saved?" checks against the dataset on disk.
//!
//! There is no separate index: a URL counts as persisted when its partition
//! directory, `<base_dir>/<category>/<source>/`, holds a record file named
//! `<article_id(url)>_*.txt`. Saving a record is therefore the only way the
//! answer changes, and a crawl pass sees its own writes.

use crate::models::{Category, Source, article_id};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Directory holding the records of one (category, source) partition.
pub fn partition_dir(base_dir: &Path, category: Category, source: Source) -> PathBuf {
    base_dir.join(category.id()).join(source.id())
}

/// True if a record for `url` already exists in the (category, source) partition.
///
/// A missing partition means nothing was saved yet. Other read errors are
/// logged and reported as "not persisted".
pub async fn already_persisted(
    base_dir: &Path,
    category: Category,
    source: Source,
    url: &str,
) -> bool {
    let dir = partition_dir(base_dir, category, source);
    let prefix = format!("{}_", article_id(url));

    let mut entries = match fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return false,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot read partition");
            return false;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with(&prefix) && name.to_lowercase().ends_with(".txt") {
                    return true;
                }
            }
            Ok(None) => return false,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Partition listing interrupted");
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://okdiario.com/deportes/articulo-x";

    #[tokio::test]
    async fn test_missing_partition_is_not_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!already_persisted(tmp.path(), Category::Deportes, Source::OkDiario, URL).await);
    }

    #[tokio::test]
    async fn test_matching_prefix_is_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = partition_dir(tmp.path(), Category::Deportes, Source::OkDiario);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}_titulo.txt", article_id(URL))), "x").unwrap();

        assert!(already_persisted(tmp.path(), Category::Deportes, Source::OkDiario, URL).await);
    }

    #[tokio::test]
    async fn test_partitions_are_independent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = partition_dir(tmp.path(), Category::Deportes, Source::OkDiario);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}_titulo.txt", article_id(URL))), "x").unwrap();

        assert!(!already_persisted(tmp.path(), Category::Economia, Source::OkDiario, URL).await);
        assert!(!already_persisted(tmp.path(), Category::Deportes, Source::ElMundo, URL).await);
    }

    #[tokio::test]
    async fn test_other_extensions_and_ids_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = partition_dir(tmp.path(), Category::Deportes, Source::OkDiario);
        std::fs::create_dir_all(&dir).unwrap();
        let id = article_id(URL);
        std::fs::write(dir.join(format!("{id}_titulo.json")), "x").unwrap();
        std::fs::write(dir.join(format!("{id}.txt")), "x").unwrap();
        std::fs::write(dir.join("0000000000_otro.txt"), "x").unwrap();

        assert!(!already_persisted(tmp.path(), Category::Deportes, Source::OkDiario, URL).await);
    }
}
