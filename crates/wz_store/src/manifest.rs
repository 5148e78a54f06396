//! Optional `manifest.json` describing an extracted archive

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name of the manifest at the archive root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Version information of an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default = "unknown_version")]
    pub version: String,
    pub display_name: Option<String>,
    pub source_region: Option<String>,
    pub extracted_date: Option<String>,
    pub encryption: Option<String>,
    #[serde(default, rename = "is64Bit")]
    pub is_64_bit: bool,
    #[serde(default, rename = "isPreBB")]
    pub is_pre_bb: bool,
    /// Per category details recorded at extraction time
    #[serde(default)]
    pub categories: IndexMap<String, CategoryManifest>,
}

/// Per category entry of a [`Manifest`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryManifest {
    #[serde(default)]
    pub file_count: usize,
    pub last_modified: Option<String>,
}

fn unknown_version() -> String {
    "unknown".into()
}

impl Manifest {
    /// The manifest used when an archive has none
    pub fn fallback(root_name: &str) -> Self {
        Self {
            version: unknown_version(),
            display_name: Some(root_name.to_owned()),
            source_region: None,
            extracted_date: None,
            encryption: None,
            is_64_bit: false,
            is_pre_bb: false,
            categories: IndexMap::new(),
        }
    }

    /// Parse manifest bytes, or fall back to defaults when there are none
    pub fn load(bytes: Option<&[u8]>, root_name: &str) -> Result<Self> {
        let Some(bytes) = bytes else {
            return Ok(Self::fallback(root_name));
        };
        let mut manifest: Manifest = serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidArgument(format!("malformed {MANIFEST_FILE}: {e}")))?;
        if manifest.display_name.is_none() {
            manifest.display_name = Some(root_name.to_owned());
        }
        Ok(manifest)
    }
}
