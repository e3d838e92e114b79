//! Bulk import endpoint
//!
//! Only the configured import file, or a regular file under the root folder,
//! may be imported. Relative request paths are taken from the root folder.
//! A refused path and a missing path get the same response.

use arithq_common::import::{ImportReport, Importer};
use axum::{extract::State, Json};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body for POST /import
#[derive(Debug, Default, Deserialize)]
pub struct ImportRequest {
    /// File to import; the configured import file when omitted
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Files the import endpoint may read
#[derive(Debug, Clone, Default)]
pub struct ImportSources {
    root_folder: Option<PathBuf>,
    import_file: Option<PathBuf>,
}

impl ImportSources {
    pub fn new(root_folder: impl Into<PathBuf>, import_file: Option<PathBuf>) -> Self {
        Self {
            root_folder: Some(root_folder.into()),
            import_file,
        }
    }

    /// Canonical path of an importable file, or `Forbidden`
    pub async fn resolve(&self, requested: Option<&Path>) -> ApiResult<PathBuf> {
        let Some(requested) = requested.or(self.import_file.as_deref()) else {
            return Err(ApiError::BadRequest(
                "No import path given and no import file configured".to_string(),
            ));
        };

        let refused = || {
            warn!("Refused import of {}", requested.display());
            ApiError::Forbidden(format!("Cannot import {}", requested.display()))
        };

        let candidate = match &self.root_folder {
            Some(root) => root.join(requested),
            None => requested.to_path_buf(),
        };
        let Ok(candidate) = tokio::fs::canonicalize(&candidate).await else {
            return Err(refused());
        };
        let is_file = tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(refused());
        }

        if let Some(file) = &self.import_file {
            if tokio::fs::canonicalize(file).await.ok().as_ref() == Some(&candidate) {
                return Ok(candidate);
            }
        }
        if let Some(root) = &self.root_folder {
            if let Ok(root) = tokio::fs::canonicalize(root).await {
                if candidate.starts_with(&root) {
                    return Ok(candidate);
                }
            }
        }

        Err(refused())
    }
}

/// POST /import
///
/// Runs the import to completion and returns its counts. Bad rows are
/// counted in the report; only an unreadable file fails the request.
pub async fn import_questions(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportReport>> {
    let path = state.import_sources.resolve(request.path.as_deref()).await?;
    let validator = state.store.validator();
    let importer = Importer::new(state.store, validator);
    let report = importer.import_file(&path).await?;
    Ok(Json(report))
}
