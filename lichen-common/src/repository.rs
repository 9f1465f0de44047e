// lichen-common/src/repository.rs
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dependency::{ArtifactMetadata, MetadataProvider};
use super::error::{LichenError, Result};
use super::model::{ArtifactCoordinate, LicenseDeclaration};

/// One artifact as stored in the index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub licenses: Vec<LicenseDeclaration>,
    #[serde(default)]
    pub dependencies: Vec<ArtifactCoordinate>,
}

impl IndexRecord {
    pub fn identifier(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    artifacts: Vec<IndexRecord>,
}

/// File-backed metadata provider. The JSON index is parsed on first lookup
/// and kept in memory, keyed by `group:artifact:version`.
pub struct ArtifactIndex {
    path: Option<PathBuf>,
    parsed_cache: Mutex<Option<HashMap<String, Arc<ArtifactMetadata>>>>,
}

impl ArtifactIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            parsed_cache: Mutex::new(None),
        }
    }

    /// An index over records already in memory.
    pub fn from_records(records: impl IntoIterator<Item = IndexRecord>) -> Self {
        Self {
            path: None,
            parsed_cache: Mutex::new(Some(index_records(records))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> Result<usize> {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&HashMap<String, Arc<ArtifactMetadata>>) -> T,
    ) -> Result<T> {
        let mut guard = self
            .parsed_cache
            .lock()
            .map_err(|_| LichenError::Generic("Artifact index cache lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(self.read_index()?);
        }
        match guard.as_ref() {
            Some(entries) => Ok(f(entries)),
            None => Err(LichenError::Generic(
                "Artifact index was not loaded".to_string(),
            )),
        }
    }

    fn read_index(&self) -> Result<HashMap<String, Arc<ArtifactMetadata>>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(HashMap::new());
        };
        if !path.is_file() {
            return Err(LichenError::NotFound(format!(
                "Artifact index '{}'",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path)?;
        let file: IndexFile = serde_json::from_str(&raw).map_err(|e| {
            LichenError::ParseError(
                "artifact index",
                format!("Failed to parse '{}': {e}", path.display()),
            )
        })?;
        debug!(
            "Parsed {} artifact record(s) from {}",
            file.artifacts.len(),
            path.display()
        );
        Ok(index_records(file.artifacts))
    }
}

fn index_records(
    records: impl IntoIterator<Item = IndexRecord>,
) -> HashMap<String, Arc<ArtifactMetadata>> {
    let mut entries = HashMap::new();
    for record in records {
        let identifier = record.identifier();
        // First record for an identifier wins.
        entries.entry(identifier).or_insert_with(|| {
            Arc::new(ArtifactMetadata {
                licenses: record.licenses,
                dependencies: record.dependencies,
            })
        });
    }
    entries
}

impl MetadataProvider for ArtifactIndex {
    fn lookup(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactMetadata> {
        let identifier = coordinate.identifier();
        let found = self.with_entries(|entries| entries.get(&identifier).cloned())?;
        match found {
            Some(metadata) => {
                debug!(
                    "Loaded '{}' from artifact index ({} license(s), {} dependency(ies))",
                    identifier,
                    metadata.licenses.len(),
                    metadata.dependencies.len()
                );
                Ok(metadata.as_ref().clone())
            }
            None => {
                debug!("'{}' not found in artifact index", identifier);
                Err(LichenError::Metadata(
                    identifier,
                    "artifact is not present in the index".to_string(),
                ))
            }
        }
    }
}
