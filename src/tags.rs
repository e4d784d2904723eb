//! Loading the tag vocabulary from a JSON file.
//!
//! The file holds an array of `{"name": ..., "super_name": ...}` objects.

use std::path::Path;
use tracing::info;

use crate::db::{BatchReport, Catalog, CatalogError, NewTag, Result, MAX_NAME_LEN};

/// Parse a vocabulary document. Any malformed entry rejects the whole file.
pub fn parse_tags(path: &Path, contents: &str) -> Result<Vec<NewTag>> {
    let invalid = |reason: String| CatalogError::InvalidTagFile {
        path: path.to_path_buf(),
        reason,
    };

    let tags: Vec<NewTag> = serde_json::from_str(contents).map_err(|e| invalid(e.to_string()))?;

    for (index, tag) in tags.iter().enumerate() {
        for (field, value) in [("name", &tag.name), ("super_name", &tag.super_name)] {
            if value.chars().count() > MAX_NAME_LEN {
                return Err(invalid(format!(
                    "entry {index}: {field} longer than {MAX_NAME_LEN} characters"
                )));
            }
        }
    }

    Ok(tags)
}

pub fn read_tag_file(path: &Path) -> Result<Vec<NewTag>> {
    let contents = std::fs::read_to_string(path).map_err(|e| CatalogError::InvalidTagFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_tags(path, &contents)
}

/// Read the vocabulary file and insert every entry.
pub fn load_tags(catalog: &Catalog, path: &Path) -> Result<BatchReport> {
    let tags = read_tag_file(path)?;
    info!("Loading {} tags from {:?}", tags.len(), path);
    catalog.insert_tags(&tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog.create_schema().unwrap();
        catalog
    }

    #[test]
    fn test_load_tags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tags.json");
        fs::write(
            &path,
            r#"[{"name":"cat","super_name":"animal"},{"name":"dog","super_name":"animal"}]"#,
        )
        .unwrap();
        let catalog = catalog();

        let report = load_tags(&catalog, &path).unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.batches, 1);

        let json = serde_json::to_value(catalog.get_tags_grouped().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"animal": ["cat", "dog"]}));
    }

    #[test]
    fn test_grouped_tags_match_input_pairs() {
        let input: Vec<NewTag> = (0..230)
            .map(|i| NewTag {
                name: format!("tag{i}"),
                super_name: format!("group{}", i % 7),
            })
            .collect();
        let catalog = catalog();
        let report = catalog.insert_tags(&input).unwrap();
        assert_eq!(report.batches, 3);

        let mut got = catalog.get_tags_grouped().unwrap().pairs();
        let mut expected: Vec<(String, String)> = input
            .into_iter()
            .map(|t| (t.name, t.super_name))
            .collect();
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_malformed_entry_rejects_whole_file() {
        let path = Path::new("tags.json");
        let err = parse_tags(
            path,
            r#"[{"name":"cat","super_name":"animal"},{"name":"dog"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTagFile { .. }));

        assert!(parse_tags(path, r#"{"name":"cat","super_name":"animal"}"#).is_err());
        assert!(parse_tags(path, r#"[{"name":1,"super_name":"animal"}]"#).is_err());
    }

    #[test]
    fn test_overlong_names_reject_file() {
        let path = Path::new("tags.json");
        let ok = format!(r#"[{{"name":"{}","super_name":"a"}}]"#, "n".repeat(255));
        assert_eq!(parse_tags(path, &ok).unwrap().len(), 1);

        let long_name = format!(r#"[{{"name":"{}","super_name":"a"}}]"#, "n".repeat(256));
        let err = parse_tags(path, &long_name).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTagFile { .. }));

        let long_super = format!(r#"[{{"name":"n","super_name":"{}"}}]"#, "s".repeat(256));
        assert!(parse_tags(path, &long_super).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_tags(&catalog(), &dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTagFile { .. }));
    }

    #[test]
    fn test_loading_twice_fails_on_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tags.json");
        fs::write(&path, r#"[{"name":"cat","super_name":"animal"}]"#).unwrap();
        let catalog = catalog();

        load_tags(&catalog, &path).unwrap();
        let err = load_tags(&catalog, &path).unwrap_err();
        assert!(matches!(err, CatalogError::Database(_)));
        assert_eq!(catalog.get_tags().unwrap().len(), 1);
    }
}
