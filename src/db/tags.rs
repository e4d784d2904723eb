use rusqlite::Row;

use super::batch::BatchReport;
use super::error::{OptionalRow, Result};
use super::models::{NewTag, Tag, TagGroups};
use super::Catalog;

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        super_name: row.get(2)?,
    })
}

impl Catalog {
    pub fn get_tag(&self, tag_id: i64) -> Result<Tag> {
        self.conn
            .query_row(
                "SELECT id, name, super_name FROM tag WHERE id = ?",
                [tag_id],
                tag_from_row,
            )
            .or_not_found("tag", tag_id)
    }

    pub fn get_tag_by_name(&self, name: &str) -> Result<Tag> {
        self.conn
            .query_row(
                "SELECT id, name, super_name FROM tag WHERE name = ?",
                [name],
                tag_from_row,
            )
            .or_not_found("tag", name)
    }

    /// Every tag, in table order.
    pub fn get_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, super_name FROM tag ORDER BY id")?;
        let tags = stmt
            .query_map([], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Insert vocabulary entries. No check against existing names: a repeated
    /// name violates the unique constraint and aborts its batch.
    pub fn insert_tags(&self, tags: &[NewTag]) -> Result<BatchReport> {
        self.insert_batched(
            "INSERT INTO tag (name, super_name) VALUES (?, ?)",
            tags,
            |stmt, tag| stmt.execute(rusqlite::params![tag.name, tag.super_name]),
        )
    }

    /// Tags attached to an image, grouped by super_name.
    ///
    /// An image with no tags gives an empty mapping; an unknown image id is
    /// `NotFound`.
    pub fn get_tags_for_image(&self, image_id: i64) -> Result<TagGroups> {
        self.get_image(image_id)?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, t.super_name
            FROM tag t
            JOIN image_to_tag it ON it.tag_id = t.id
            WHERE it.image_id = ?
            ORDER BY it.id
            "#,
        )?;
        let tags = stmt
            .query_map([image_id], tag_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags.iter().collect())
    }

    /// The whole vocabulary grouped by super_name.
    pub fn get_tags_grouped(&self) -> Result<TagGroups> {
        Ok(self.get_tags()?.iter().collect())
    }
}
