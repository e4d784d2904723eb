/// Catalog tables, in creation order. Dropping walks this list backwards so
/// the join table goes before the tables it references.
pub const TABLES: [&str; 4] = ["dataset_info", "image", "tag", "image_to_tag"];

/// Longest image or tag name, in characters.
pub const MAX_NAME_LEN: usize = 255;

pub const SCHEMA: &str = r#"
-- Dataset info: singleton row describing where images live
CREATE TABLE dataset_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_root TEXT NOT NULL,
    image_exts TEXT NOT NULL
);

-- Images: one row per file name found under image_root
CREATE TABLE image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(255) NOT NULL UNIQUE CHECK (length(name) <= 255)
);

-- Tags: fixed vocabulary, grouped by super_name
CREATE TABLE tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(255) NOT NULL UNIQUE CHECK (length(name) <= 255),
    super_name VARCHAR(255) NOT NULL CHECK (length(super_name) <= 255)
);

-- Image <-> tag associations
CREATE TABLE image_to_tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    UNIQUE (image_id, tag_id),
    FOREIGN KEY (image_id) REFERENCES image(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tag(id) ON DELETE CASCADE
);

CREATE INDEX idx_image_to_tag_image ON image_to_tag(image_id);
CREATE INDEX idx_image_to_tag_tag ON image_to_tag(tag_id);
"#;
