//! Loading default values and schemas from files, strings and URLs.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::types::{json_type_name, Values};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_json_str(&content)
}

/// Load a JSON document from a string.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    tracing::debug!(url, "fetching remote document");
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    // Check for HTTP errors before parsing
    let response = client
        .get(url)
        .send()
        .map_err(network)?
        .error_for_status()
        .map_err(network)?;

    response.json().map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load from a URL when `source` looks like one, otherwise from a file.
pub fn load_json_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            return load_json_url(source);
        }
        #[cfg(not(feature = "remote"))]
        {
            return Err(LoadError::RemoteDisabled {
                url: source.to_string(),
            });
        }
    }
    load_json(Path::new(source))
}

/// Load a field-values mapping (e.g. form defaults).
///
/// # Errors
///
/// Returns `LoadError::NotAnObject` if the document isn't a JSON object.
pub fn load_values(source: &str) -> Result<Values, LoadError> {
    into_values(load_json_auto(source)?)
}

/// Convert a parsed document into a values mapping.
pub fn into_values(document: Value) -> Result<Values, LoadError> {
    match document {
        Value::Object(values) => Ok(values),
        other => Err(LoadError::NotAnObject {
            actual: json_type_name(&other).to_string(),
        }),
    }
}
