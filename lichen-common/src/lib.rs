// lichen-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod model;
pub mod policy;
pub mod repository;

// Re-export key types
pub use config::Config;
pub use error::{LichenError, Result};
pub use model::{ArtifactCoordinate, LicenseDeclaration, Scope, ValidationResult};
pub use policy::LicensePolicy;
pub use repository::ArtifactIndex;
