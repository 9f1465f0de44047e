// lichen/src/cli/report.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use lichen_common::config::Config;
use lichen_common::error::Result;
use lichen_common::model::ValidationResult;
use lichen_core::settings::{load_settings, RunSettings};
use lichen_core::sink::results_file;
use lichen_core::read_results;
use prettytable::{format, Cell, Row, Table};
use tracing::warn;

#[derive(Args, Debug)]
pub struct Report {
    /// Directory holding licenses.csv of a previous run
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Show only invalid results
    #[arg(long)]
    pub invalid_only: bool,
}

impl Report {
    pub fn run(&self, config: &Config) -> Result<()> {
        let dir = config.output_dir();

        match load_settings(dir) {
            Ok(settings) if settings.options.skip => {
                println!("{}", skipped_notice(&settings).yellow());
                return Ok(());
            }
            Ok(settings) => println!("{}{}", "==> ".bold().blue(), settings_line(&settings)),
            Err(e) => warn!("Run settings are not available: {}", e),
        }

        let results = read_results(&results_file(dir))?;
        let shown: Vec<&ValidationResult> = results
            .iter()
            .filter(|r| !self.invalid_only || !r.valid)
            .collect();
        if shown.is_empty() {
            println!("{}", "No results to show".yellow());
        } else {
            render_table(&shown).printstd();
        }

        let invalid = results.iter().filter(|r| !r.valid).count();
        if invalid == 0 {
            println!("{} {} result(s), all valid", "✓".green(), results.len());
        } else {
            println!(
                "{} {} result(s), {} invalid",
                "✗".red(),
                results.len(),
                invalid
            );
        }
        Ok(())
    }
}

fn settings_line(settings: &RunSettings) -> String {
    let o = &settings.options;
    format!(
        "Licenses of {} (recursive={}, skip_test_scope={}, skip_provided_scope={}, skip_optionals={})",
        settings.root.bold(),
        o.recursive,
        o.skip_test_scope,
        o.skip_provided_scope,
        o.skip_optionals
    )
}

fn skipped_notice(settings: &RunSettings) -> String {
    format!(
        "The last run for {} was skipped; no current results to show",
        settings.root
    )
}

fn render_table(results: &[&ValidationResult]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(Row::new(
        [
            "Group",
            "Artifact",
            "Version",
            "Classifier",
            "Type",
            "Scope",
            "License",
            "Comment",
            "Result",
        ]
        .into_iter()
        .map(|h| Cell::new(h).style_spec("b"))
        .collect(),
    ));

    for result in results {
        let a = &result.artifact;
        let license = result
            .matched_license()
            .or(result.original_license())
            .unwrap_or("-");
        let verdict = if result.valid {
            Cell::new("valid").style_spec("Fg")
        } else {
            Cell::new("invalid").style_spec("Fr")
        };
        table.add_row(Row::new(vec![
            Cell::new(&a.group_id),
            Cell::new(&a.artifact_id).style_spec("Fb"),
            Cell::new(&a.version),
            Cell::new(&a.classifier),
            Cell::new(&a.kind),
            Cell::new(&a.scope),
            Cell::new(license),
            Cell::new(&result.comment),
            verdict,
        ]));
    }
    table
}
