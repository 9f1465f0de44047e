// lichen-core/src/audit.rs
use std::fmt;
use std::path::{Path, PathBuf};

use lichen_common::config::RunOptions;
use lichen_common::dependency::{
    BranchFailure, CycleReport, DependencyResolver, MetadataProvider, ResolutionContext,
};
use lichen_common::error::{LichenError, Result};
use lichen_common::model::{ArtifactCoordinate, ValidationResult};
use lichen_common::LicensePolicy;
use tracing::{debug, info, warn};

use crate::classify::{Classification, Classifier, ClassifyOptions};
use crate::settings::{save_settings, RunSettings};
use crate::sink::ResultWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Skipped,
    /// Every artifact was classified and some results are invalid.
    Failed { violations: Vec<ValidationResult> },
    /// Classification stopped at the first invalid artifact.
    FailedFast { cause: ValidationResult },
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed | Self::Skipped)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "all licenses are valid"),
            Self::Skipped => write!(f, "license validation was skipped"),
            Self::Failed { violations } => {
                write!(f, "{} invalid license result(s) found", violations.len())
            }
            Self::FailedFast { cause } => write!(
                f,
                "stopped at '{}' ({})",
                cause.artifact.identifier(),
                cause.comment
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditReport {
    pub root: ArtifactCoordinate,
    pub verdict: Verdict,
    /// Absent for skipped runs.
    pub classification: Option<Classification>,
    pub cycles: Vec<CycleReport>,
    pub failures: Vec<BranchFailure>,
    pub results_file: Option<PathBuf>,
    pub settings_file: PathBuf,
}

impl AuditReport {
    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }

    /// Turns a failed verdict into [`LichenError::InvalidLicenses`].
    pub fn into_result(self) -> Result<Self> {
        match &self.verdict {
            Verdict::Passed | Verdict::Skipped => Ok(self),
            Verdict::Failed { violations } => {
                let artifacts: Vec<String> = violations
                    .iter()
                    .map(|v| v.artifact.identifier())
                    .collect();
                Err(LichenError::InvalidLicenses(format!(
                    "{} invalid result(s) for {}",
                    violations.len(),
                    artifacts.join(", ")
                )))
            }
            Verdict::FailedFast { cause } => Err(LichenError::InvalidLicenses(format!(
                "'{}' ({})",
                cause.artifact.identifier(),
                cause.comment
            ))),
        }
    }
}

/// Resolves the dependencies of `root`, classifies them against `policy` and
/// writes every result to `<output_dir>/licenses.csv`.
///
/// The effective options are stored in `<output_dir>/settings.json` first,
/// also when the run is skipped.
pub fn run_audit(
    root: &ArtifactCoordinate,
    options: &RunOptions,
    policy: &LicensePolicy,
    provider: &dyn MetadataProvider,
    output_dir: &Path,
) -> Result<AuditReport> {
    let settings_file = save_settings(
        output_dir,
        &RunSettings {
            root: root.identifier(),
            options: *options,
        },
    )?;

    if options.skip {
        info!("Skipping license validation of '{}'", root.identifier());
        return Ok(AuditReport {
            root: root.clone(),
            verdict: Verdict::Skipped,
            classification: None,
            cycles: Vec::new(),
            failures: Vec::new(),
            results_file: None,
            settings_file,
        });
    }

    info!("Validating licenses of '{}'...", root.identifier());
    let mut resolver = DependencyResolver::new(ResolutionContext {
        provider,
        options: options.resolve_options(),
    });
    let resolved = resolver.resolve(root)?;
    if !resolved.failures.is_empty() {
        warn!(
            "{} dependency branch(es) could not be resolved and were left out",
            resolved.failures.len()
        );
    }

    let mut writer = ResultWriter::create(output_dir)?;
    let classifier = Classifier::new(policy, ClassifyOptions::from(options));
    let classification =
        classifier.classify_with(&resolved.tree, |result| writer.write(result))?;
    let results_file = writer.finish()?;

    let verdict = if classification.halted {
        match classification.first_violation() {
            Some(cause) => Verdict::FailedFast {
                cause: cause.clone(),
            },
            None => Verdict::Passed,
        }
    } else if classification.is_valid() {
        Verdict::Passed
    } else {
        Verdict::Failed {
            violations: classification.violations().cloned().collect(),
        }
    };
    debug!("Audit of '{}' finished: {}", root.identifier(), verdict);

    Ok(AuditReport {
        root: root.clone(),
        verdict,
        classification: Some(classification),
        cycles: resolved.cycles,
        failures: resolved.failures,
        results_file: Some(results_file),
        settings_file,
    })
}
