use std::collections::{HashSet, VecDeque};

use super::batch::BatchReport;
use super::error::{OptionalRow, Result};
use super::models::Image;
use super::Catalog;

/// Rows fetched per round trip by `ImageIter`.
const PAGE_SIZE: i64 = 256;

impl Catalog {
    pub fn get_image(&self, image_id: i64) -> Result<Image> {
        self.conn
            .query_row(
                "SELECT id, name FROM image WHERE id = ?",
                [image_id],
                |row| {
                    Ok(Image {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .or_not_found("image", image_id)
    }

    pub fn get_image_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM image", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Names of every image already recorded.
    pub fn get_image_names(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM image")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(names)
    }

    /// Insert new image rows by name, in the order given.
    pub fn insert_images(&self, names: &[String]) -> Result<BatchReport> {
        self.insert_batched("INSERT INTO image (name) VALUES (?)", names, |stmt, name| {
            stmt.execute([name])
        })
    }

    /// Iterate every image in id order.
    ///
    /// Rows are fetched lazily a page at a time. Call again to start over.
    pub fn images(&self) -> ImageIter<'_> {
        ImageIter {
            catalog: self,
            buffer: VecDeque::new(),
            last_id: 0,
            done: false,
        }
    }

    fn image_page(&self, after_id: i64) -> Result<Vec<Image>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM image WHERE id > ? ORDER BY id LIMIT ?")?;
        let page = stmt
            .query_map([after_id, PAGE_SIZE], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(page)
    }
}

/// Lazy, keyset-paged walk over the image table.
pub struct ImageIter<'a> {
    catalog: &'a Catalog,
    buffer: VecDeque<Image>,
    last_id: i64,
    done: bool,
}

impl Iterator for ImageIter<'_> {
    type Item = Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match self.catalog.image_page(self.last_id) {
                Ok(page) => {
                    if (page.len() as i64) < PAGE_SIZE {
                        self.done = true;
                    }
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        let image = self.buffer.pop_front()?;
        self.last_id = image.id;
        Some(Ok(image))
    }
}
