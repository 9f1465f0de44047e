// lichen-common/src/dependency/provider.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ArtifactCoordinate, LicenseDeclaration};

/// What an artifact's own metadata declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub licenses: Vec<LicenseDeclaration>,
    #[serde(default)]
    pub dependencies: Vec<ArtifactCoordinate>,
}

/// Source of artifact metadata (a repository, a cache, an index file).
pub trait MetadataProvider {
    fn lookup(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactMetadata>;
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for &T {
    fn lookup(&self, coordinate: &ArtifactCoordinate) -> Result<ArtifactMetadata> {
        (**self).lookup(coordinate)
    }
}
