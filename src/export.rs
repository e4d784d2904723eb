//! Dumping catalog tables as JSON or CSV, for browsing and admin use.

use serde::Serialize;
use std::str::FromStr;

use crate::db::{Catalog, Image};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => anyhow::bail!("unknown export format `{other}`"),
        }
    }
}

/// The catalog tables that can be dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    DatasetInfo,
    Image,
    Tag,
    ImageToTag,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::DatasetInfo, Table::Image, Table::Tag, Table::ImageToTag];

    pub fn name(&self) -> &'static str {
        match self {
            Table::DatasetInfo => "dataset_info",
            Table::Image => "image",
            Table::Tag => "tag",
            Table::ImageToTag => "image_to_tag",
        }
    }
}

impl FromStr for Table {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown table `{s}`"))
    }
}

/// Render every row of `table` in `format`.
pub fn export_table(catalog: &Catalog, table: Table, format: ExportFormat) -> anyhow::Result<String> {
    match table {
        Table::DatasetInfo => {
            let rows = match catalog.get_dataset_info() {
                Ok(info) => vec![info],
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            render(&rows, format)
        }
        Table::Image => {
            let rows = catalog.images().collect::<crate::db::Result<Vec<Image>>>()?;
            render(&rows, format)
        }
        Table::Tag => render(&catalog.get_tags()?, format),
        Table::ImageToTag => render(&catalog.get_image_tag_links()?, format),
    }
}

fn render<T: Serialize>(rows: &[T], format: ExportFormat) -> anyhow::Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in rows {
                writer.serialize(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("flushing csv: {}", e.error()))?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}
