// lichen-common/src/model/mod.rs
pub mod coordinate;
pub mod license;
pub mod result;

// Re-export
pub use coordinate::{ArtifactCoordinate, Scope};
pub use license::{ApprovedDependency, KnownLicense, LicenseDeclaration, ValidLicenseEntry};
pub use result::{ArtifactInformation, ValidationResult};
