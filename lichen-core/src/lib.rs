// lichen-core/src/lib.rs

pub mod audit;
pub mod classify;
pub mod settings;
pub mod sink;

// Re-export key types for the CLI crate
pub use audit::{run_audit, AuditReport, Verdict};
pub use classify::{ArtifactVerdict, Classification, Classifier, ClassifyOptions};
pub use sink::{read_results, write_results, ResultWriter, RESULTS_FILE};
