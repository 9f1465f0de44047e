// lichen-core/src/sink.rs
//! Durable record stream of validation results.
//!
//! One record per line, twelve comma separated fields:
//!
//! ```text
//! group,artifact,version,classifier,type,scope,"license",license-url,"original-license",original-license-url,"comment",valid
//! ```
//!
//! License names and the comment are always quoted. Other fields are quoted
//! only when they contain a comma, a quote or a line break. Quotes inside a
//! quoted field are doubled.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lichen_common::error::{LichenError, Result};
use lichen_common::model::{ArtifactInformation, ValidationResult};
use tracing::debug;

pub const RESULTS_FILE: &str = "licenses.csv";
const FIELD_COUNT: usize = 12;

pub fn results_file(dir: &Path) -> PathBuf {
    dir.join(RESULTS_FILE)
}

pub struct ResultWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl ResultWriter {
    /// Creates `<dir>/licenses.csv`, replacing results of a previous run.
    pub fn create(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            debug!("Directory '{}' is not present. Creating it...", dir.display());
            fs::create_dir_all(dir)?;
        } else if !dir.is_dir() {
            return Err(LichenError::Generic(format!(
                "'{}' is not a directory, but is supposed to be.",
                dir.display()
            )));
        }

        let path = results_file(dir);
        if path.exists() {
            debug!("Results file exists. Deleting it to remove obsolete results.");
            fs::remove_file(&path)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, result: &ValidationResult) -> Result<()> {
        self.writer.write_all(format_record(result).as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flushes the stream and returns the path of the results file.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        debug!(
            "Wrote {} result(s) to {}",
            self.written,
            self.path.display()
        );
        Ok(self.path)
    }
}

pub fn write_results(dir: &Path, results: &[ValidationResult]) -> Result<PathBuf> {
    let mut writer = ResultWriter::create(dir)?;
    for result in results {
        writer.write(result)?;
    }
    writer.finish()
}

pub fn read_results(path: &Path) -> Result<Vec<ValidationResult>> {
    if !path.is_file() {
        return Err(LichenError::NotFound(format!(
            "Results file '{}'",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    let results = split_records(&content)?
        .into_iter()
        .map(parse_record)
        .collect::<Result<Vec<_>>>()?;
    debug!("Read {} result(s) from {}", results.len(), path.display());
    Ok(results)
}

pub fn format_record(result: &ValidationResult) -> String {
    let a = &result.artifact;
    [
        plain(&a.group_id),
        plain(&a.artifact_id),
        plain(&a.version),
        plain(&a.classifier),
        plain(&a.kind),
        plain(&a.scope),
        quoted(&result.license_name),
        plain(&result.license_url),
        quoted(&result.original_license_name),
        plain(&result.original_license_url),
        quoted(&result.comment),
        result.valid.to_string(),
    ]
    .join(",")
}

pub fn parse_record(record: &str) -> Result<ValidationResult> {
    let fields: [String; FIELD_COUNT] = split_record(record)?
        .try_into()
        .map_err(|fields: Vec<String>| {
            LichenError::ParseError(
                "result record",
                format!("expected {FIELD_COUNT} fields, found {}: {record}", fields.len()),
            )
        })?;
    let [
        group_id,
        artifact_id,
        version,
        classifier,
        kind,
        scope,
        license_name,
        license_url,
        original_license_name,
        original_license_url,
        comment,
        valid,
    ] = fields;

    let valid = match valid.as_str() {
        "true" => true,
        "false" => false,
        other => {
            return Err(LichenError::ParseError(
                "result record",
                format!("valid flag must be 'true' or 'false', found '{other}'"),
            ))
        }
    };

    Ok(ValidationResult {
        artifact: ArtifactInformation {
            group_id,
            artifact_id,
            version,
            classifier,
            kind,
            scope,
        },
        license_name,
        license_url,
        original_license_name,
        original_license_url,
        comment,
        valid,
    })
}

/// Splits one record into its fields, unquoting where needed.
pub fn split_record(record: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut chars = record.chars().peekable();

    'fields: loop {
        let mut field = String::new();

        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => {
                        return Err(LichenError::ParseError(
                            "result record",
                            format!("unterminated quoted field: {record}"),
                        ))
                    }
                }
            }
            fields.push(field);
            match chars.next() {
                Some(',') => continue 'fields,
                None => break 'fields,
                Some(c) => {
                    return Err(LichenError::ParseError(
                        "result record",
                        format!("unexpected '{c}' after quoted field: {record}"),
                    ))
                }
            }
        }

        loop {
            match chars.next() {
                Some(',') => {
                    fields.push(field);
                    continue 'fields;
                }
                None => {
                    fields.push(field);
                    break 'fields;
                }
                Some('"') => {
                    return Err(LichenError::ParseError(
                        "result record",
                        format!("stray quote in unquoted field: {record}"),
                    ))
                }
                Some(c) => field.push(c),
            }
        }
    }

    Ok(fields)
}

/// Splits the file content into records. Line breaks inside quoted fields
/// belong to the field; blank lines are ignored.
fn split_records(content: &str) -> Result<Vec<&str>> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                push_record(&mut records, &content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(LichenError::ParseError(
            "result record",
            "results file ends inside a quoted field".to_string(),
        ));
    }
    push_record(&mut records, &content[start..]);
    Ok(records)
}

fn push_record<'a>(records: &mut Vec<&'a str>, raw: &'a str) {
    let record = raw.strip_suffix('\r').unwrap_or(raw);
    if !record.is_empty() {
        records.push(record);
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn plain(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}
