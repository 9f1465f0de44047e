// lichen-common/src/model/result.rs
use serde::{Deserialize, Serialize};

use super::coordinate::ArtifactCoordinate;
use super::license::{KnownLicense, LicenseDeclaration};

/// Flat snapshot of an artifact coordinate as it appears in the result
/// stream. Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactInformation {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: String,
    pub kind: String,
    pub scope: String,
}

impl ArtifactInformation {
    /// `group:artifact:version`
    pub fn identifier(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl From<&ArtifactCoordinate> for ArtifactInformation {
    fn from(c: &ArtifactCoordinate) -> Self {
        Self {
            group_id: c.group_id.clone(),
            artifact_id: c.artifact_id.clone(),
            version: c.version.clone(),
            classifier: c.classifier_str().to_string(),
            kind: c.kind.clone(),
            scope: c.scope_str().to_string(),
        }
    }
}

/// Outcome of checking one artifact, or one declared license of an
/// artifact, against the license policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub artifact: ArtifactInformation,
    /// Name of the matched known license, empty if none matched.
    pub license_name: String,
    pub license_url: String,
    /// The license as declared by the artifact, empty if none.
    pub original_license_name: String,
    pub original_license_url: String,
    pub comment: String,
    pub valid: bool,
}

impl ValidationResult {
    pub fn new(
        coordinate: &ArtifactCoordinate,
        license: Option<&KnownLicense>,
        original: Option<&LicenseDeclaration>,
        comment: impl Into<String>,
        valid: bool,
    ) -> Self {
        Self {
            artifact: ArtifactInformation::from(coordinate),
            license_name: license.map(|l| l.name.clone()).unwrap_or_default(),
            license_url: license.map(|l| l.url.clone()).unwrap_or_default(),
            original_license_name: original
                .and_then(|o| o.name.clone())
                .unwrap_or_default(),
            original_license_url: original.and_then(|o| o.url.clone()).unwrap_or_default(),
            comment: comment.into(),
            valid,
        }
    }

    pub fn matched_license(&self) -> Option<&str> {
        Some(self.license_name.as_str()).filter(|n| !n.is_empty())
    }

    pub fn original_license(&self) -> Option<&str> {
        Some(self.original_license_name.as_str()).filter(|n| !n.is_empty())
    }
}
