mod batch;
mod error;
mod images;
mod models;
mod schema;
mod tags;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::info;

pub use batch::{BatchReport, BATCH_SIZE};
pub use error::{CatalogError, Result};
pub use images::ImageIter;
pub use models::{DatasetInfo, EntityRef, Image, ImageToTag, NewTag, Tag, TagGroups};
pub use schema::{MAX_NAME_LEN, SCHEMA, TABLES};

/// File name used for the database when no explicit path is given.
pub const DEFAULT_DB_NAME: &str = "hic.db";

/// The image catalog: owns the single SQLite connection.
///
/// Construct one and hand it to whatever needs it; there is no global handle.
pub struct Catalog {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("path", &self.path).finish()
    }
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a catalog that must already be on disk. Never creates the file
    /// or its parent directories.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CatalogError::NoDataset);
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Path of the database file, `None` for in-memory catalogs.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ========================================================================
    // Schema lifecycle
    // ========================================================================

    fn existing_tables(&self) -> Result<Vec<String>> {
        let mut existing = Vec::new();
        for table in TABLES {
            let found: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(name) = found {
                existing.push(name);
            }
        }
        Ok(existing)
    }

    /// True if any catalog table is present.
    pub fn schema_exists(&self) -> Result<bool> {
        Ok(!self.existing_tables()?.is_empty())
    }

    /// Create all catalog tables. Fails with `SchemaExists` if any of them is
    /// already there.
    pub fn create_schema(&self) -> Result<()> {
        if let Some(table) = self.existing_tables()?.into_iter().next() {
            return Err(CatalogError::SchemaExists(table));
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        info!("Created catalog schema");
        Ok(())
    }

    /// Drop all catalog tables.
    ///
    /// Dropping a schema that does not exist is a no-op and returns `false`.
    pub fn drop_schema(&self) -> Result<bool> {
        if !self.schema_exists()? {
            info!("No catalog schema to drop");
            return Ok(false);
        }
        let tx = self.conn.unchecked_transaction()?;
        for table in TABLES.iter().rev() {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        }
        tx.commit()?;
        info!("Dropped catalog schema");
        Ok(true)
    }

    // ========================================================================
    // Dataset info
    // ========================================================================

    /// Record where images live. Called once during initialization.
    pub fn set_dataset_info(&self, image_root: &str, image_exts: &str) -> Result<DatasetInfo> {
        self.conn.execute(
            "INSERT INTO dataset_info (image_root, image_exts) VALUES (?, ?)",
            rusqlite::params![image_root, image_exts],
        )?;
        Ok(DatasetInfo {
            id: self.conn.last_insert_rowid(),
            image_root: image_root.to_string(),
            image_exts: image_exts.to_string(),
        })
    }

    pub fn get_dataset_info(&self) -> Result<DatasetInfo> {
        let result = self.conn.query_row(
            "SELECT id, image_root, image_exts FROM dataset_info ORDER BY id LIMIT 1",
            [],
            |row| {
                Ok(DatasetInfo {
                    id: row.get(0)?,
                    image_root: row.get(1)?,
                    image_exts: row.get(2)?,
                })
            },
        );
        match result {
            Ok(info) => Ok(info),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CatalogError::NoDataset),
            Err(e) => Err(e.into()),
        }
    }

    /// Location of an image file on disk, from the dataset root.
    pub fn image_path(&self, image: &Image) -> Result<PathBuf> {
        let info = self.get_dataset_info()?;
        Ok(Path::new(&info.image_root).join(&image.name))
    }

    // ========================================================================
    // Join table
    // ========================================================================

    /// Tag an image. Returns `false` if the image already had the tag.
    pub fn add_tag_to_image(
        &self,
        image: impl Into<EntityRef<Image>>,
        tag: impl Into<EntityRef<Tag>>,
    ) -> Result<bool> {
        let image = match image.into() {
            EntityRef::Id(id) => self.get_image(id)?,
            EntityRef::Resolved(image) => image,
        };
        let tag = match tag.into() {
            EntityRef::Id(id) => self.get_tag(id)?,
            EntityRef::Resolved(tag) => tag,
        };
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO image_to_tag (image_id, tag_id) VALUES (?, ?)",
            rusqlite::params![image.id, tag.id],
        )?;
        Ok(inserted > 0)
    }

    /// Untag an image. Returns `false` if the association did not exist.
    pub fn remove_tag_from_image(&self, image_id: i64, tag_id: i64) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM image_to_tag WHERE image_id = ? AND tag_id = ?",
            rusqlite::params![image_id, tag_id],
        )?;
        Ok(removed > 0)
    }

    pub fn get_image_tag_links(&self) -> Result<Vec<ImageToTag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, image_id, tag_id FROM image_to_tag ORDER BY id")?;
        let links = stmt
            .query_map([], |row| {
                Ok(ImageToTag {
                    id: row.get(0)?,
                    image_id: row.get(1)?,
                    tag_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    pub fn get_images_with_tag(&self, tag_id: i64) -> Result<Vec<Image>> {
        self.get_tag(tag_id)?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT i.id, i.name
            FROM image i
            JOIN image_to_tag it ON it.image_id = i.id
            WHERE it.tag_id = ?
            ORDER BY it.id
            "#,
        )?;
        let images = stmt
            .query_map([tag_id], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }
}
