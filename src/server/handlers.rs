use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{AppError, AppResult};
use super::AppState;
use crate::db::{DatasetInfo, TagGroups};
use crate::export::{self, ExportFormat, Table};

/// `image/<ext>` from the file name, lowercased.
pub fn image_mime_type(name: &str) -> String {
    match std::path::Path::new(name).extension() {
        Some(ext) => format!("image/{}", ext.to_string_lossy().to_lowercase()),
        None => "application/octet-stream".to_string(),
    }
}

/// `inline; filename="..."` with anything that could break the quoted string
/// or the header (quotes, backslashes, control and non-ASCII characters)
/// replaced by `_`.
pub fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("inline; filename=\"{safe}\"")
}

/// GET /image/{image_id}
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<i64>,
) -> AppResult<Response> {
    let (path, name) = {
        let catalog = state.catalog()?;
        let image = catalog.get_image(image_id)?;
        (catalog.image_path(&image)?, image.name)
    };
    debug!("Serving image {} from {:?}", image_id, path);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Image {} is recorded but missing on disk: {:?}", image_id, path);
            return Err(AppError::not_found(format!("image file not found: {name}")));
        }
        Err(e) => return Err(AppError::internal(format!("reading {path:?}: {e}"))),
    };

    let headers = [
        (header::CONTENT_TYPE, image_mime_type(&name)),
        (header::CONTENT_DISPOSITION, content_disposition(&name)),
    ];
    Ok((headers, bytes).into_response())
}

#[derive(Debug, Serialize)]
pub struct ImageCount {
    pub count: i64,
}

/// GET /image/count
pub async fn get_image_count(State(state): State<AppState>) -> AppResult<Json<ImageCount>> {
    let count = state.catalog()?.get_image_count()?;
    Ok(Json(ImageCount { count }))
}

/// GET /image/{image_id}/tag
pub async fn get_image_tags(
    State(state): State<AppState>,
    Path(image_id): Path<i64>,
) -> AppResult<Json<TagGroups>> {
    let groups = state.catalog()?.get_tags_for_image(image_id)?;
    Ok(Json(groups))
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagChange {
    pub image_id: i64,
    pub tag: String,
    /// Whether the call changed anything: a row was created or removed.
    pub changed: bool,
}

/// POST /image/{image_id}/tag/{tag_name}
pub async fn add_image_tag(
    State(state): State<AppState>,
    Path((image_id, tag_name)): Path<(i64, String)>,
) -> AppResult<Json<TagChange>> {
    let catalog = state.catalog()?;
    let tag = catalog.get_tag_by_name(&tag_name)?;
    let changed = catalog.add_tag_to_image(image_id, tag)?;
    info!("Tagged image {} with {:?} (new: {})", image_id, tag_name, changed);

    Ok(Json(TagChange {
        image_id,
        tag: tag_name,
        changed,
    }))
}

/// DELETE /image/{image_id}/tag/{tag_name}
pub async fn remove_image_tag(
    State(state): State<AppState>,
    Path((image_id, tag_name)): Path<(i64, String)>,
) -> AppResult<Json<TagChange>> {
    let catalog = state.catalog()?;
    let image = catalog.get_image(image_id)?;
    let tag = catalog.get_tag_by_name(&tag_name)?;
    let changed = catalog.remove_tag_from_image(image.id, tag.id)?;
    info!("Untagged image {} from {:?} (removed: {})", image_id, tag_name, changed);

    Ok(Json(TagChange {
        image_id,
        tag: tag_name,
        changed,
    }))
}

/// GET /tag
pub async fn get_tags(State(state): State<AppState>) -> AppResult<Json<TagGroups>> {
    let groups = state.catalog()?.get_tags_grouped()?;
    Ok(Json(groups))
}

/// GET /dataset
pub async fn get_dataset(State(state): State<AppState>) -> AppResult<Json<DatasetInfo>> {
    let info = state.catalog()?.get_dataset_info()?;
    Ok(Json(info))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    format: Option<String>,
}

/// GET /admin/{table}?format=json|csv
pub async fn export_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let table: Table = table
        .parse()
        .map_err(|e: anyhow::Error| AppError::not_found(e.to_string()))?;
    let format = match query.format.as_deref() {
        Some(format) => format
            .parse()
            .map_err(|e: anyhow::Error| AppError::bad_request(e.to_string()))?,
        None => ExportFormat::Json,
    };

    let body = export::export_table(&*state.catalog()?, table, format)?;
    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}
