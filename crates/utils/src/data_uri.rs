//! Parsing for `data:<mime>;base64,<payload>` URIs as produced by browser file readers.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,
    #[error("data URI must be base64 encoded")]
    NotBase64,
    #[error("data URI has no MIME type")]
    MissingMimeType,
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// A validated base64 data URI. The payload is kept encoded since every consumer forwards it as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: String,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (header, data) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        if mime_type.is_empty() {
            return Err(DataUriError::MissingMimeType);
        }

        STANDARD
            .decode(data)
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))?;

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            data: data.to_string(),
        })
    }

    /// Cheap check used to tell an inline file apart from free text.
    pub fn looks_like(input: &str) -> bool {
        input.trim_start().starts_with("data:")
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    /// File extension for the MIME type, if it is one the app stores.
    pub fn extension(&self) -> Option<&'static str> {
        match self.mime_type.as_str() {
            "image/png" => Some("png"),
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            "image/heic" => Some("heic"),
            "application/pdf" => Some("pdf"),
            _ => None,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| DataUriError::InvalidPayload(e.to_string()))
    }

    pub fn decoded_len(&self) -> usize {
        // 4 encoded chars carry 3 bytes; padding shortens the last group.
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        self.data.len() / 4 * 3 - padding
    }
}
