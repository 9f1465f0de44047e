// lichen-core/src/classify.rs
//! Classification of resolved dependencies against a [`LicensePolicy`].
//!
//! Every distinct dependency of the tree (root excluded, first occurrence
//! in pre-order wins) yields one result, or one result per declared license.

use lichen_common::config::{RunOptions, TestScopePrecedence};
use lichen_common::dependency::DependencyTree;
use lichen_common::error::Result;
use lichen_common::model::{ArtifactCoordinate, LicenseDeclaration, ValidationResult};
use lichen_common::LicensePolicy;
use tracing::{debug, error, info};

pub const TEST_SCOPE: &str = "test scope";
pub const NO_LICENSE_APPROVED: &str = "no license found, dependency is approved";
pub const NO_LICENSE_NOT_APPROVED: &str = "no license found and artifact is not approved";
pub const APPROVED_BY_ARTIFACT: &str = "license is approved by artifact";
pub const LICENSE_APPROVED: &str = "license is approved";
pub const LICENSE_NOT_APPROVED: &str = "license is not approved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyOptions {
    pub skip_test_scope: bool,
    pub test_scope_precedence: TestScopePrecedence,
    /// Stop after the first artifact with an invalid result.
    pub fail_fast: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        ClassifyOptions::from(&RunOptions::default())
    }
}

impl From<&RunOptions> for ClassifyOptions {
    fn from(options: &RunOptions) -> Self {
        Self {
            skip_test_scope: options.skip_test_scope,
            test_scope_precedence: options.test_scope_precedence,
            fail_fast: options.fail_fast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactVerdict {
    pub coordinate: ArtifactCoordinate,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Results in the order they were produced.
    pub results: Vec<ValidationResult>,
    /// One entry per classified artifact.
    pub artifacts: Vec<ArtifactVerdict>,
    /// Set when fail-fast stopped the walk early.
    pub halted: bool,
}

impl Classification {
    pub fn is_valid(&self) -> bool {
        self.artifacts.iter().all(|a| a.valid)
    }

    pub fn invalid_artifacts(&self) -> impl Iterator<Item = &ArtifactCoordinate> {
        self.artifacts
            .iter()
            .filter(|a| !a.valid)
            .map(|a| &a.coordinate)
    }

    pub fn violations(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.valid)
    }

    pub fn first_violation(&self) -> Option<&ValidationResult> {
        self.violations().next()
    }
}

pub struct Classifier<'a> {
    policy: &'a LicensePolicy,
    options: ClassifyOptions,
}

impl<'a> Classifier<'a> {
    pub fn new(policy: &'a LicensePolicy, options: ClassifyOptions) -> Self {
        Self { policy, options }
    }

    pub fn classify(&self, tree: &DependencyTree) -> Result<Classification> {
        self.classify_with(tree, |_| Ok(()))
    }

    /// Classifies the tree, handing every result to `on_result` as soon as it
    /// is produced. An error from `on_result` aborts the walk.
    pub fn classify_with<F>(
        &self,
        tree: &DependencyTree,
        mut on_result: F,
    ) -> Result<Classification>
    where
        F: FnMut(&ValidationResult) -> Result<()>,
    {
        let mut classification = Classification::default();

        for id in tree.distinct_dependencies() {
            let node = tree.node(id);
            let results = self.classify_artifact(&node.coordinate, &node.licenses);
            let valid = results.iter().all(|r| r.valid);

            for result in &results {
                log_result(result);
                on_result(result)?;
            }
            classification.results.extend(results);
            classification.artifacts.push(ArtifactVerdict {
                coordinate: node.coordinate.clone(),
                valid,
            });

            if !valid && self.options.fail_fast {
                debug!(
                    "Fail fast: stopping classification after '{}'",
                    node.coordinate
                );
                classification.halted = true;
                break;
            }
        }

        debug!(
            "Classified {} artifact(s) into {} result(s)",
            classification.artifacts.len(),
            classification.results.len()
        );
        Ok(classification)
    }

    /// Results for a single artifact with the given declared licenses.
    pub fn classify_artifact(
        &self,
        coordinate: &ArtifactCoordinate,
        licenses: &[LicenseDeclaration],
    ) -> Vec<ValidationResult> {
        let test_scoped = self.options.skip_test_scope && coordinate.is_test_scope();
        let test_scope_result =
            || vec![ValidationResult::new(coordinate, None, None, TEST_SCOPE, true)];

        if test_scoped && self.options.test_scope_precedence == TestScopePrecedence::Unconditional {
            return test_scope_result();
        }

        let results = self.check_licenses(coordinate, licenses);
        if test_scoped && results.iter().any(|r| !r.valid) {
            debug!(
                "'{}' fails the policy but is test scoped, accepting it",
                coordinate.identifier()
            );
            return test_scope_result();
        }
        results
    }

    fn check_licenses(
        &self,
        coordinate: &ArtifactCoordinate,
        licenses: &[LicenseDeclaration],
    ) -> Vec<ValidationResult> {
        let identifier = coordinate.identifier();

        if licenses.is_empty() {
            let result = match self.policy.approved_dependency(&identifier) {
                Some(approved) => ValidationResult::new(
                    coordinate,
                    approved.license,
                    None,
                    NO_LICENSE_APPROVED,
                    true,
                ),
                None => {
                    ValidationResult::new(coordinate, None, None, NO_LICENSE_NOT_APPROVED, false)
                }
            };
            return vec![result];
        }

        // Only an approval that names a license can vouch for declared ones.
        let approved_license = self
            .policy
            .approved_dependency(&identifier)
            .and_then(|m| m.license);

        licenses
            .iter()
            .map(|declared| {
                if let Some(known) = approved_license {
                    return ValidationResult::new(
                        coordinate,
                        Some(known),
                        Some(declared),
                        APPROVED_BY_ARTIFACT,
                        true,
                    );
                }
                match declared.name().and_then(|n| self.policy.declared_license(n)) {
                    Some(matched) => ValidationResult::new(
                        coordinate,
                        matched.license,
                        Some(declared),
                        LICENSE_APPROVED,
                        true,
                    ),
                    None => ValidationResult::new(
                        coordinate,
                        None,
                        Some(declared),
                        LICENSE_NOT_APPROVED,
                        false,
                    ),
                }
            })
            .collect()
    }
}

fn log_result(result: &ValidationResult) {
    let mut line = String::from("License ");
    if let Some(name) = result.original_license() {
        line.push_str(&format!("'{name}' "));
        if !result.original_license_url.is_empty() {
            line.push_str(&format!("({}) ", result.original_license_url));
        }
    }
    line.push_str(&format!(
        "checked for artifact '{}': >> ",
        result.artifact.identifier()
    ));
    if result.valid {
        let as_name = result
            .matched_license()
            .or(result.original_license())
            .unwrap_or("-");
        info!("{}valid as '{}' ({})", line, as_name, result.comment);
    } else {
        error!("{}invalid ({})", line, result.comment);
    }
}

#[cfg(test)]
mod tests {
    use lichen_common::model::{ApprovedDependency, KnownLicense, ValidLicenseEntry};
    use pretty_assertions::assert_eq;

    use super::*;

    fn coord(name: &str, scope: &str) -> ArtifactCoordinate {
        ArtifactCoordinate::new("org.test", name, "1.0").with_scope(scope)
    }

    fn whitelist(valid: &[&str], approved: &[&str]) -> LicensePolicy {
        LicensePolicy::whitelist(
            valid.iter().map(|v| ValidLicenseEntry::new(*v)).collect(),
            approved.iter().map(|a| ApprovedDependency::new(*a)).collect(),
            vec![],
        )
        .unwrap()
    }

    fn comments(results: &[ValidationResult]) -> Vec<(&str, bool)> {
        results.iter().map(|r| (r.comment.as_str(), r.valid)).collect()
    }

    #[test]
    fn unlicensed_artifacts_need_approval() {
        let policy = whitelist(&[], &[r"org\.test:approved:.*"]);
        let classifier = Classifier::new(&policy, ClassifyOptions::default());

        let results = classifier.classify_artifact(&coord("approved", "compile"), &[]);
        assert_eq!(comments(&results), [(NO_LICENSE_APPROVED, true)]);
        assert!(results[0].comment.contains("approved"));

        let results = classifier.classify_artifact(&coord("other", "compile"), &[]);
        assert_eq!(comments(&results), [(NO_LICENSE_NOT_APPROVED, false)]);
    }

    #[test]
    fn valid_license_names_are_literal() {
        let policy = whitelist(&["Apache-2.0"], &[]);
        let classifier = Classifier::new(&policy, ClassifyOptions::default());

        let results = classifier
            .classify_artifact(&coord("a", "compile"), &[LicenseDeclaration::new("Apache-2.0")]);
        assert_eq!(comments(&results), [(LICENSE_APPROVED, true)]);
        assert_eq!(results[0].original_license(), Some("Apache-2.0"));

        let results = classifier
            .classify_artifact(&coord("a", "compile"), &[LicenseDeclaration::new("GPL-3.0")]);
        assert_eq!(comments(&results), [(LICENSE_NOT_APPROVED, false)]);

        // absent or empty names never match
        let results = classifier.classify_artifact(
            &coord("a", "compile"),
            &[LicenseDeclaration::default(), LicenseDeclaration::new("")],
        );
        assert_eq!(
            comments(&results),
            [(LICENSE_NOT_APPROVED, false), (LICENSE_NOT_APPROVED, false)]
        );
    }

    #[test]
    fn every_declared_license_must_pass() {
        let policy = whitelist(&["MIT"], &[]);
        let classifier = Classifier::new(&policy, ClassifyOptions::default());
        let mut tree = DependencyTree::new(coord("root", "compile"), vec![]);
        tree.add_child(
            tree.root(),
            coord("dual", "compile"),
            vec![LicenseDeclaration::new("MIT"), LicenseDeclaration::new("GPL-2.0")],
        );

        let classification = classifier.classify(&tree).unwrap();
        assert_eq!(classification.results.len(), 2);
        assert!(!classification.is_valid());
        assert_eq!(
            classification.first_violation().map(|r| r.comment.as_str()),
            Some(LICENSE_NOT_APPROVED)
        );
    }

    #[test]
    fn approval_with_license_vouches_for_declared_licenses() {
        let known = KnownLicense::new("inhouse", "In-House License", "https://example.org/l");
        let policy = LicensePolicy::whitelist(
            vec![],
            vec![
                ApprovedDependency::new(r"org\.test:linked:.*").with_key("inhouse"),
                ApprovedDependency::new(r"org\.test:bare:.*"),
            ],
            vec![known],
        )
        .unwrap();
        let classifier = Classifier::new(&policy, ClassifyOptions::default());
        let declared = [LicenseDeclaration::new("Proprietary")];

        let results = classifier.classify_artifact(&coord("linked", "compile"), &declared);
        assert_eq!(comments(&results), [(APPROVED_BY_ARTIFACT, true)]);
        assert_eq!(results[0].matched_license(), Some("In-House License"));

        // an approval without a license falls through to name matching
        let results = classifier.classify_artifact(&coord("bare", "compile"), &declared);
        assert_eq!(comments(&results), [(LICENSE_NOT_APPROVED, false)]);
    }

    #[test]
    fn catalog_matches_aliases() {
        let policy = LicensePolicy::catalog(vec![KnownLicense::new(
            "mit",
            "MIT License",
            "https://opensource.org/licenses/MIT",
        )
        .with_alias("MIT")])
        .unwrap();
        let classifier = Classifier::new(&policy, ClassifyOptions::default());

        let results =
            classifier.classify_artifact(&coord("a", "runtime"), &[LicenseDeclaration::new("MIT")]);
        assert_eq!(comments(&results), [(LICENSE_APPROVED, true)]);
        assert_eq!(results[0].matched_license(), Some("MIT License"));
        assert_eq!(results[0].license_url, "https://opensource.org/licenses/MIT");
    }

    #[test]
    fn whitelist_accepts_known_license_aliases() {
        let apache = KnownLicense::new(
            "apache-2.0",
            "Apache License, Version 2.0",
            "https://www.apache.org/licenses/LICENSE-2.0",
        )
        .with_alias("Apache-2.0");
        let policy =
            LicensePolicy::whitelist(vec![ValidLicenseEntry::new("MIT")], vec![], vec![apache])
                .unwrap();
        let classifier = Classifier::new(&policy, ClassifyOptions::default());

        for declared in ["Apache-2.0", "Apache License, Version 2.0"] {
            let results = classifier
                .classify_artifact(&coord("a", "compile"), &[LicenseDeclaration::new(declared)]);
            assert_eq!(comments(&results), [(LICENSE_APPROVED, true)]);
            assert_eq!(results[0].matched_license(), Some("Apache License, Version 2.0"));
            assert_eq!(results[0].original_license(), Some(declared));
        }

        let results = classifier
            .classify_artifact(&coord("a", "compile"), &[LicenseDeclaration::new("GPL-3.0")]);
        assert_eq!(comments(&results), [(LICENSE_NOT_APPROVED, false)]);
    }

    #[test]
    fn test_scope_precedence() {
        let policy = whitelist(&["MIT"], &[]);
        let gpl = [LicenseDeclaration::new("GPL-3.0")];
        let mit = [LicenseDeclaration::new("MIT")];

        let unconditional = Classifier::new(&policy, ClassifyOptions::default());
        let results = unconditional.classify_artifact(&coord("t", "TEST"), &mit);
        assert_eq!(comments(&results), [(TEST_SCOPE, true)]);
        assert_eq!(results[0].artifact.scope, "TEST");

        let when_unapproved = Classifier::new(
            &policy,
            ClassifyOptions {
                test_scope_precedence: TestScopePrecedence::WhenUnapproved,
                ..ClassifyOptions::default()
            },
        );
        let results = when_unapproved.classify_artifact(&coord("t", "test"), &mit);
        assert_eq!(comments(&results), [(LICENSE_APPROVED, true)]);
        let results = when_unapproved.classify_artifact(&coord("t", "test"), &gpl);
        assert_eq!(comments(&results), [(TEST_SCOPE, true)]);

        let not_skipped = Classifier::new(
            &policy,
            ClassifyOptions {
                skip_test_scope: false,
                ..ClassifyOptions::default()
            },
        );
        let results = not_skipped.classify_artifact(&coord("t", "test"), &gpl);
        assert_eq!(comments(&results), [(LICENSE_NOT_APPROVED, false)]);
    }

    fn abc_tree() -> DependencyTree {
        let mut tree = DependencyTree::new(coord("root", "compile"), vec![]);
        let root = tree.root();
        tree.add_child(root, coord("a", "compile"), vec![LicenseDeclaration::new("MIT")]);
        tree.add_child(root, coord("b", "compile"), vec![LicenseDeclaration::new("GPL-3.0")]);
        tree.add_child(root, coord("c", "compile"), vec![LicenseDeclaration::new("MIT")]);
        tree
    }

    #[test]
    fn fail_fast_stops_after_first_invalid_artifact() {
        let policy = whitelist(&["MIT"], &[]);
        let tree = abc_tree();

        let fast = Classifier::new(
            &policy,
            ClassifyOptions {
                fail_fast: true,
                ..ClassifyOptions::default()
            },
        );
        let classification = fast.classify(&tree).unwrap();
        assert!(classification.halted);
        let seen: Vec<_> = classification
            .artifacts
            .iter()
            .map(|a| a.coordinate.artifact_id.as_str())
            .collect();
        assert_eq!(seen, ["a", "b"]);
        assert_eq!(
            classification.first_violation().map(|r| r.artifact.artifact_id.as_str()),
            Some("b")
        );

        let all = Classifier::new(&policy, ClassifyOptions::default());
        let classification = all.classify(&tree).unwrap();
        assert!(!classification.halted);
        assert_eq!(classification.artifacts.len(), 3);
        let invalid: Vec<_> = classification
            .invalid_artifacts()
            .map(|c| c.artifact_id.as_str())
            .collect();
        assert_eq!(invalid, ["b"]);
    }

    #[test]
    fn repeated_coordinates_are_classified_once() {
        let policy = whitelist(&["MIT"], &[]);
        let mut tree = DependencyTree::new(coord("root", "compile"), vec![]);
        let root = tree.root();
        let a = tree.add_child(root, coord("a", "compile"), vec![LicenseDeclaration::new("MIT")]);
        tree.add_child(a, coord("shared", "compile"), vec![LicenseDeclaration::new("MIT")]);
        tree.add_child(root, coord("shared", "compile"), vec![LicenseDeclaration::new("MIT")]);
        tree.add_child(root, coord("shared", "runtime"), vec![LicenseDeclaration::new("MIT")]);

        let classification = Classifier::new(&policy, ClassifyOptions::default())
            .classify(&tree)
            .unwrap();
        let seen: Vec<_> = classification
            .results
            .iter()
            .map(|r| format!("{}/{}", r.artifact.artifact_id, r.artifact.scope))
            .collect();
        assert_eq!(seen, ["a/compile", "shared/compile", "shared/runtime"]);
    }

    #[test]
    fn sink_errors_abort_classification() {
        let policy = whitelist(&["MIT"], &[]);
        let err = Classifier::new(&policy, ClassifyOptions::default())
            .classify_with(&abc_tree(), |_| {
                Err(lichen_common::LichenError::Generic("disk full".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, lichen_common::LichenError::Generic(_)));
    }
}
