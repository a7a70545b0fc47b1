//! User file uploads kept on the local disk.
//!
//! Files land at `<upload_dir>/users/<uid>/<folder>/<uuid>.<ext>` and are served
//! back under [`PUBLIC_PREFIX`] with the same relative path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use ts_rs::TS;
use utils::data_uri::{DataUri, DataUriError};
use uuid::Uuid;

use super::config::StorageConfig;

/// URL path prefix the server mounts the upload directory on.
pub const PUBLIC_PREFIX: &str = "/uploads";
/// Largest decoded file accepted.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file: {0}")]
    InvalidFile(#[from] DataUriError),
    #[error("{folder} uploads do not accept {mime_type} files")]
    UnsupportedType {
        folder: &'static str,
        mime_type: String,
    },
    #[error("file is larger than {} MB", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,
    #[error("invalid user id")]
    InvalidOwner,
    #[error("Failed to upload file. Please try again.")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Errors caused by the uploaded content rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StorageError::Io(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum UploadFolder {
    #[default]
    Images,
    SoilReports,
    PlantImages,
}

impl UploadFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::Images => "images",
            UploadFolder::SoilReports => "soil-reports",
            UploadFolder::PlantImages => "plant-images",
        }
    }

    /// Soil reports may be PDFs; everything else must be an image.
    fn accepts(&self, uri: &DataUri) -> bool {
        match self {
            UploadFolder::SoilReports => uri.is_image() || uri.is_pdf(),
            UploadFolder::Images | UploadFolder::PlantImages => uri.is_image(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct StoredFile {
    /// Server-relative URL, suitable for `file_url` / `photo_url`.
    pub url: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
}

fn valid_owner(owner_id: &str) -> bool {
    !owner_id.is_empty()
        && owner_id.len() <= 128
        && owner_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode `data_uri` and write it under the owner's folder.
    pub async fn save(
        &self,
        owner_id: &str,
        folder: UploadFolder,
        data_uri: &str,
    ) -> Result<StoredFile, StorageError> {
        if !valid_owner(owner_id) {
            return Err(StorageError::InvalidOwner);
        }
        let uri = DataUri::parse(data_uri)?;
        let extension = match uri.extension() {
            Some(ext) if folder.accepts(&uri) => ext,
            _ => {
                return Err(StorageError::UnsupportedType {
                    folder: folder.as_str(),
                    mime_type: uri.mime_type,
                });
            }
        };
        if uri.decoded_len() > MAX_UPLOAD_BYTES {
            return Err(StorageError::TooLarge);
        }
        let bytes = uri.decode()?;

        let relative = format!(
            "users/{owner_id}/{}/{}.{extension}",
            folder.as_str(),
            Uuid::new_v4()
        );
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &bytes).await?;
        tracing::info!(
            owner_id,
            folder = folder.as_str(),
            size = bytes.len(),
            "Stored upload"
        );

        Ok(StoredFile {
            url: format!("{PUBLIC_PREFIX}/{relative}"),
            mime_type: uri.mime_type,
            size_bytes: bytes.len() as u64,
        })
    }
}
