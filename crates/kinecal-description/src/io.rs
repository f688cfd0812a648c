//! JSON reading and writing for descriptions.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DescriptionError;
use crate::schema::{DescriptionDocument, InstrumentDescription};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a JSON string into any description type.
pub fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<T, DescriptionError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a JSON description file.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DescriptionError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| DescriptionError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value = from_json_str(&content)?;
    tracing::info!(path = %path.display(), "read description");
    Ok(value)
}

/// Pretty-printed JSON.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String, DescriptionError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), DescriptionError> {
    let path = path.as_ref();
    std::fs::write(path, to_json_string(value)?).map_err(|e| DescriptionError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "wrote description");
    Ok(())
}

/// Read an instrument file, accepting a bare positioner description too.
pub fn read_instrument(path: impl AsRef<Path>) -> Result<InstrumentDescription, DescriptionError> {
    let document: DescriptionDocument = read_json(path)?;
    Ok(document.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
