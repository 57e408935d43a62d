//! Bulk dependency manifests: the `import_list` wire format.
//!
//! A manifest is a JSON array of 3- or 4-element tuples:
//!
//! ```text
//! [
//!   ["engine/core.js",  ["engine.core"],            [],              2048],
//!   ["engine/rooms.js", ["engine.rooms"],           ["engine.core"]],
//!   ["vendor.js",       ["vendor"],                 ["@http://host/lib.js"]]
//! ]
//! ```
//!
//! Unit ids without a leading `/` or a `:` are relative and resolve against
//! the manifest's own directory. Parsing fails as a whole on the first
//! malformed row so a bad manifest never half-registers.

use std::path::PathBuf;

/// Errors from manifest fetching and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed manifest row {index}: {reason}")]
    Malformed { index: usize, reason: String },
}

/// Collaborator that produces manifest text for a path.
pub trait ManifestSource {
    fn fetch(&mut self, path: &str) -> Result<String, ManifestError>;
}

/// Manifest source reading from the local filesystem, relative to a root.
pub struct FsManifestSource {
    root: PathBuf,
}

impl FsManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ManifestSource for FsManifestSource {
    fn fetch(&mut self, path: &str) -> Result<String, ManifestError> {
        Ok(std::fs::read_to_string(self.root.join(path))?)
    }
}

/// One registration row parsed out of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub unit: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub approx_size: u64,
}

/// Parse manifest text into registration rows.
pub fn parse(text: &str) -> Result<Vec<ManifestEntry>, ManifestError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let rows = value.as_array().ok_or_else(|| ManifestError::Malformed {
        index: 0,
        reason: "top level is not an array".into(),
    })?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| parse_row(index, row))
        .collect()
}

fn parse_row(index: usize, row: &serde_json::Value) -> Result<ManifestEntry, ManifestError> {
    let malformed = |reason: &str| ManifestError::Malformed {
        index,
        reason: reason.into(),
    };

    let fields = row
        .as_array()
        .ok_or_else(|| malformed("row is not an array"))?;
    if fields.len() < 3 || fields.len() > 4 {
        return Err(malformed("expected [unit, provides, requires, size?]"));
    }

    let unit = fields[0]
        .as_str()
        .ok_or_else(|| malformed("unit id is not a string"))?
        .to_string();
    let provides =
        string_list(&fields[1]).ok_or_else(|| malformed("provides is not a string array"))?;
    let requires =
        string_list(&fields[2]).ok_or_else(|| malformed("requires is not a string array"))?;
    let approx_size = match fields.get(3) {
        Some(v) => v
            .as_u64()
            .ok_or_else(|| malformed("size is not an unsigned integer"))?,
        None => 0,
    };

    Ok(ManifestEntry {
        unit,
        provides,
        requires,
        approx_size,
    })
}

fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Resolve a manifest-relative unit id against the manifest's directory.
/// Ids starting with `/` or containing a `:` (a scheme) are taken verbatim.
pub fn resolve_unit_id(manifest_path: &str, unit: &str) -> String {
    if unit.starts_with('/') || unit.contains(':') {
        return unit.to_string();
    }
    match manifest_path.rfind('/') {
        Some(idx) => format!("{}/{}", &manifest_path[..idx], unit),
        None => unit.to_string(),
    }
}
