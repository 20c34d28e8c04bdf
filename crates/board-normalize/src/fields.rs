//! External per-footprint field data, keyed by reference designator.

use crate::error::{AssemblyError, ExtractError};
use log::{error, warn};
use std::collections::BTreeMap;
use std::path::Path;

pub type FieldMap = BTreeMap<String, String>;

pub trait FieldSource {
    /// Fields for one reference designator, `None` if the source lacks it.
    fn fields(&self, reference: &str) -> Option<&FieldMap>;
}

/// Field data read from a JSON object of `{"R1": {"MPN": "...", ...}, ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonFieldSource {
    by_ref: BTreeMap<String, FieldMap>,
}

impl JsonFieldSource {
    pub fn new(by_ref: BTreeMap<String, FieldMap>) -> Self {
        Self { by_ref }
    }

    pub fn from_slice(data: &[u8], normalize_case: bool) -> Result<Self, ExtractError> {
        let mut by_ref: BTreeMap<String, FieldMap> = serde_json::from_slice(data)?;
        if normalize_case {
            for fields in by_ref.values_mut() {
                *fields = std::mem::take(fields)
                    .into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect();
            }
        }
        Ok(Self { by_ref })
    }

    pub fn load(path: &Path, normalize_case: bool) -> Result<Self, ExtractError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data, normalize_case)
    }
}

impl FieldSource for JsonFieldSource {
    fn fields(&self, reference: &str) -> Option<&FieldMap> {
        self.by_ref.get(reference)
    }
}

/// Decide whether field data takes part in this extraction and load it.
///
/// Returns `Ok(None)` when fields are not needed. Needed fields with no
/// readable source are a hard failure.
pub fn load_configured(
    needed: bool,
    path: Option<&Path>,
    normalize_case: bool,
) -> Result<Option<JsonFieldSource>, AssemblyError> {
    let Some(path) = path else {
        if needed {
            warn!("Ignoring extra field options since no field source was given");
        }
        return Ok(None);
    };
    let data = if path.is_file() {
        match JsonFieldSource::load(path, normalize_case) {
            Ok(source) => Some(source),
            Err(e) => {
                error!("Failed parsing {}: {e}", path.display());
                None
            }
        }
    } else {
        None
    };
    match data {
        None if needed => Err(AssemblyError::FieldSourceUnavailable(path.to_path_buf())),
        Some(source) if needed => Ok(Some(source)),
        _ => Ok(None),
    }
}
