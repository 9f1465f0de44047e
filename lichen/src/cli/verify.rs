// lichen/src/cli/verify.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use lichen_common::config::{Config, RunOptions, TestScopePrecedence};
use lichen_common::error::{LichenError, Result};
use lichen_common::model::ArtifactCoordinate;
use lichen_common::{ArtifactIndex, LicensePolicy};
use lichen_core::{run_audit, AuditReport, Verdict};
use tracing::{debug, warn};

#[derive(Args, Debug)]
pub struct Verify {
    /// Artifact to audit, as group:artifact:version[:type[:classifier]]
    pub root: ArtifactCoordinate,

    /// Artifact index (JSON) used to look up licenses and dependencies
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Directory receiving licenses.csv and settings.json
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop at the first artifact with an invalid license
    #[arg(long)]
    pub fail_fast: bool,

    /// Only check the direct dependencies of the root
    #[arg(long)]
    pub no_recursive: bool,

    /// Resolve and check test scoped dependencies
    #[arg(long)]
    pub include_test_scope: bool,

    /// Resolve and check provided scoped dependencies
    #[arg(long)]
    pub include_provided_scope: bool,

    /// Resolve and check optional dependencies
    #[arg(long)]
    pub include_optionals: bool,

    /// Accept test scoped artifacts only when their licenses fail
    #[arg(long)]
    pub test_scope_when_unapproved: bool,

    /// Compare scopes too when detecting dependency cycles
    #[arg(long)]
    pub cycle_includes_scope: bool,

    /// Store the settings but do not check anything
    #[arg(long)]
    pub skip: bool,
}

impl Verify {
    pub fn run(&self, config: &Config) -> Result<()> {
        let options = self.effective_options(config.options);
        debug!("Effective run options: {:?}", options);

        let policy = LicensePolicy::from_config(&config.policy)?;
        let index_path = self
            .index
            .clone()
            .or_else(|| config.index_path.clone())
            .ok_or_else(|| {
                LichenError::Config(
                    "No artifact index configured. Pass --index, set LICHEN_INDEX \
                     or add 'index' to lichen.toml"
                        .to_string(),
                )
            })?;
        let index = ArtifactIndex::new(index_path);

        let report = match run_audit(&self.root, &options, &policy, &index, config.output_dir()) {
            Ok(report) => report,
            Err(e) => {
                if matches!(index.is_empty(), Ok(true)) {
                    warn!("Artifact index {:?} holds no artifacts", index.path());
                }
                return Err(e);
            }
        };
        print_summary(&report);
        report.into_result().map(|_| ())
    }

    fn effective_options(&self, mut options: RunOptions) -> RunOptions {
        if self.fail_fast {
            options.fail_fast = true;
        }
        if self.no_recursive {
            options.recursive = false;
        }
        if self.include_test_scope {
            options.skip_test_scope = false;
        }
        if self.include_provided_scope {
            options.skip_provided_scope = false;
        }
        if self.include_optionals {
            options.skip_optionals = false;
        }
        if self.test_scope_when_unapproved {
            options.test_scope_precedence = TestScopePrecedence::WhenUnapproved;
        }
        if self.cycle_includes_scope {
            options.cycle_includes_scope = true;
        }
        if self.skip {
            options.skip = true;
        }
        options
    }
}

fn print_summary(report: &AuditReport) {
    let root = report.root.identifier();

    for cycle in &report.cycles {
        println!(
            "{} cycle at '{}' (via {} artifact(s))",
            "Warning:".yellow().bold(),
            cycle.repeated.identifier(),
            cycle.path.len()
        );
    }
    for failure in &report.failures {
        println!(
            "{} could not resolve '{}' required by '{}': {}",
            "Warning:".yellow().bold(),
            failure.coordinate.identifier(),
            failure.requested_by.identifier(),
            failure.error
        );
    }

    if let Some(classification) = &report.classification {
        println!(
            "{}{} artifact(s) checked, {} result(s)",
            "==> ".bold().blue(),
            classification.artifacts.len(),
            classification.results.len()
        );
    }
    if let Some(path) = &report.results_file {
        println!("{}Results written to {}", "==> ".bold().blue(), path.display());
    }

    match &report.verdict {
        Verdict::Passed => println!("{} {}: {}", "✓".green(), root.bold(), report.verdict),
        Verdict::Skipped => println!("{} {}: {}", "-".yellow(), root.bold(), report.verdict),
        Verdict::Failed { violations } => {
            println!("{} {}: {}", "✗".red(), root.bold(), report.verdict);
            for violation in violations {
                println!(
                    "    {} {} ({})",
                    "✗".red(),
                    violation.artifact.identifier(),
                    violation.comment
                );
            }
        }
        Verdict::FailedFast { .. } => {
            println!("{} {}: {}", "✗".red(), root.bold(), report.verdict)
        }
    }
}
