//! One-shot reconciliation of the image directory with the image table.
//!
//! Files present on disk but not yet recorded are inserted; nothing is ever
//! removed or renamed.

pub mod discovery;

use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::db::{Catalog, Result};

pub use discovery::{discover_images, has_allowed_extension, parse_extensions};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Accepted image files found on disk.
    pub found: usize,
    /// Image rows that existed before the sync.
    pub known: usize,
    /// Rows inserted by this sync.
    pub inserted: usize,
    /// Transactions used for the inserts.
    pub batches: usize,
    /// Rows inserted by each transaction.
    pub batch_sizes: Vec<usize>,
}

/// Insert every accepted file under `image_root` that the catalog does not
/// know about yet, in ascending name order.
pub fn sync_directory(catalog: &Catalog, image_root: &Path, extensions: &[String]) -> Result<SyncReport> {
    info!("Searching image files {:?} in {:?}", extensions, image_root);

    let on_disk = discover_images(image_root, extensions)?;
    info!("{} files found", on_disk.len());

    sync_names(catalog, &on_disk)
}

/// Insert the names from an already discovered listing that the catalog does
/// not know about yet.
pub fn sync_names(catalog: &Catalog, on_disk: &BTreeSet<String>) -> Result<SyncReport> {
    let in_db = catalog.get_image_names()?;
    info!("{} records found in catalog", in_db.len());

    // BTreeSet iteration is already sorted by name
    let new_images: Vec<String> = on_disk
        .iter()
        .filter(|name| !in_db.contains(*name))
        .cloned()
        .collect();
    info!("Inserting {} images", new_images.len());

    let report = catalog.insert_images(&new_images)?;

    Ok(SyncReport {
        found: on_disk.len(),
        known: in_db.len(),
        inserted: report.rows,
        batches: report.batches,
        batch_sizes: report.batch_sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Image;
    use std::fs::File;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.create_schema().unwrap();
        catalog
    }

    fn all_images(catalog: &Catalog) -> Vec<Image> {
        catalog.images().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_sync_filters_by_extension() {
        let dir = tempdir().unwrap();
        for name in ["a.png", "b.txt", "c.JPG"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let catalog = catalog();

        let report = sync_directory(&catalog, dir.path(), &parse_extensions(".png,.jpg")).unwrap();

        assert_eq!(report.inserted, 2);
        let names: Vec<String> = all_images(&catalog).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a.png", "c.JPG"]);
    }

    #[test]
    fn test_second_sync_inserts_nothing() {
        let dir = tempdir().unwrap();
        for name in ["x.png", "y.gif"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let catalog = catalog();
        let exts = parse_extensions(".png,.gif");

        sync_directory(&catalog, dir.path(), &exts).unwrap();
        let after_first = all_images(&catalog);

        let report = sync_directory(&catalog, dir.path(), &exts).unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.batches, 0);
        assert_eq!(report.known, 2);
        assert_eq!(all_images(&catalog), after_first);
    }

    #[test]
    fn test_sync_picks_up_new_files_only() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("b.png")).unwrap();
        let catalog = catalog();
        let exts = parse_extensions(".png");

        sync_directory(&catalog, dir.path(), &exts).unwrap();
        File::create(dir.path().join("a.png")).unwrap();
        File::create(dir.path().join("c.png")).unwrap();
        let report = sync_directory(&catalog, dir.path(), &exts).unwrap();

        assert_eq!(report.found, 3);
        assert_eq!(report.inserted, 2);
        // New rows go in sorted order after the existing one
        let names: Vec<String> = all_images(&catalog).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["b.png", "a.png", "c.png"]);
    }

    #[test]
    fn test_sync_250_files_in_three_batches() {
        let dir = tempdir().unwrap();
        for i in 0..250 {
            File::create(dir.path().join(format!("{i:03}.bmp"))).unwrap();
        }
        let catalog = catalog();

        let report = sync_directory(&catalog, dir.path(), &parse_extensions(".bmp")).unwrap();

        assert_eq!(report.inserted, 250);
        assert_eq!(report.batches, 3);
        assert_eq!(report.batch_sizes, vec![100, 100, 50]);
        assert_eq!(catalog.get_image_count().unwrap(), 250);
    }
}
