//! First-time setup of a catalog: schema, dataset row, images and tags.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::db::{BatchReport, Catalog, NewTag, Result};
use crate::scanner::{self, SyncReport};
use crate::tags;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub image_root: PathBuf,
    /// Comma separated, lowercase, with leading dots.
    pub image_exts: String,
    pub tags_path: PathBuf,
    /// Drop any existing catalog tables first.
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub dropped_existing: bool,
    pub images: SyncReport,
    pub tags: BatchReport,
}

/// Build a fresh catalog. Fails with `SchemaExists` if tables are already
/// present and `force` is off.
///
/// The image directory and tag file are read before anything is written. If
/// a write fails after the schema was created, the schema is dropped again so
/// no half-built catalog is left behind.
pub fn initialize(catalog: &Catalog, options: &InitOptions) -> Result<InitReport> {
    let extensions = scanner::parse_extensions(&options.image_exts);
    let on_disk = scanner::discover_images(&options.image_root, &extensions)?;
    let vocabulary = tags::read_tag_file(&options.tags_path)?;
    info!(
        "Found {} image files and {} tags to load",
        on_disk.len(),
        vocabulary.len()
    );

    let dropped_existing = if options.force {
        catalog.drop_schema()?
    } else {
        false
    };

    catalog.create_schema()?;

    let (images, tags) = match populate(catalog, options, &on_disk, &vocabulary) {
        Ok(reports) => reports,
        Err(e) => {
            warn!("Initialization failed, removing partial catalog: {}", e);
            catalog.drop_schema()?;
            return Err(e);
        }
    };

    info!(
        "Catalog initialized: {} images, {} tags",
        images.inserted, tags.rows
    );

    Ok(InitReport {
        dropped_existing,
        images,
        tags,
    })
}

fn populate(
    catalog: &Catalog,
    options: &InitOptions,
    on_disk: &BTreeSet<String>,
    vocabulary: &[NewTag],
) -> Result<(SyncReport, BatchReport)> {
    catalog.set_dataset_info(&options.image_root.to_string_lossy(), &options.image_exts)?;
    let images = scanner::sync_names(catalog, on_disk)?;
    let tags = catalog.insert_tags(vocabulary)?;
    Ok((images, tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogError;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, InitOptions) {
        let dir = tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir(&images).unwrap();
        File::create(images.join("a.png")).unwrap();
        File::create(images.join("b.jpeg")).unwrap();
        let tags_path = dir.path().join("tags.json");
        fs::write(&tags_path, r#"[{"name":"cat","super_name":"animal"}]"#).unwrap();

        let options = InitOptions {
            image_root: images,
            image_exts: ".png,.jpg,.jpeg".to_string(),
            tags_path,
            force: false,
        };
        (dir, options)
    }

    #[test]
    fn test_initialize() {
        let (_dir, options) = setup();
        let catalog = Catalog::open_in_memory().unwrap();

        let report = initialize(&catalog, &options).unwrap();
        assert!(!report.dropped_existing);
        assert_eq!(report.images.inserted, 2);
        assert_eq!(report.tags.rows, 1);

        let info = catalog.get_dataset_info().unwrap();
        assert_eq!(info.image_exts, ".png,.jpg,.jpeg");
        assert_eq!(PathBuf::from(info.image_root), options.image_root);
    }

    #[test]
    fn test_reinitialize_requires_force() {
        let (_dir, mut options) = setup();
        let catalog = Catalog::open_in_memory().unwrap();
        initialize(&catalog, &options).unwrap();
        catalog.add_tag_to_image(1_i64, 1_i64).unwrap();

        let err = initialize(&catalog, &options).unwrap_err();
        assert!(matches!(err, CatalogError::SchemaExists(_)));

        options.force = true;
        let report = initialize(&catalog, &options).unwrap();
        assert!(report.dropped_existing);
        assert_eq!(catalog.get_image_count().unwrap(), 2);
        assert!(catalog.get_image_tag_links().unwrap().is_empty());
    }

    #[test]
    fn test_bad_tag_file_leaves_no_schema() {
        let (dir, options) = setup();
        fs::write(&options.tags_path, r#"[{"name":"cat"}]"#).unwrap();
        let db_path = dir.path().join("hic.db");

        {
            let catalog = Catalog::open(&db_path).unwrap();
            let err = initialize(&catalog, &options).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidTagFile { .. }));
        }

        let reopened = Catalog::open(&db_path).unwrap();
        assert!(!reopened.schema_exists().unwrap());
    }

    #[test]
    fn test_failed_insert_drops_partial_catalog() {
        let (_dir, options) = setup();
        // Parses fine but violates the unique tag name on insert
        fs::write(
            &options.tags_path,
            r#"[{"name":"cat","super_name":"animal"},{"name":"cat","super_name":"pet"}]"#,
        )
        .unwrap();
        let catalog = Catalog::open_in_memory().unwrap();

        let err = initialize(&catalog, &options).unwrap_err();
        assert!(matches!(err, CatalogError::Database(_)));
        assert!(!catalog.schema_exists().unwrap());
    }

    #[test]
    fn test_bad_input_keeps_existing_catalog_with_force() {
        let (_dir, mut options) = setup();
        let catalog = Catalog::open_in_memory().unwrap();
        initialize(&catalog, &options).unwrap();

        options.force = true;
        options.tags_path = options.tags_path.with_file_name("missing.json");
        let err = initialize(&catalog, &options).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTagFile { .. }));

        // Nothing was dropped because the input was rejected up front
        assert_eq!(catalog.get_image_count().unwrap(), 2);
        assert_eq!(catalog.get_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_image_root_aborts() {
        let (dir, mut options) = setup();
        options.image_root = dir.path().join("missing");
        let catalog = Catalog::open_in_memory().unwrap();

        let err = initialize(&catalog, &options).unwrap_err();
        assert!(matches!(err, CatalogError::DirectoryAccess { .. }));
        assert!(!catalog.schema_exists().unwrap());
    }
}
