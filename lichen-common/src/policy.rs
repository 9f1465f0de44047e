// lichen-common/src/policy.rs
//! License policy: which declared licenses and which artifacts are approved.
//!
//! Two configuration styles exist. The whitelist style lists literal license
//! names and approved artifact patterns, optionally linked to known licenses
//! by key. The catalog style lists known licenses only, each carrying its own
//! approved artifact patterns. In both styles a declared license is valid
//! when it matches a literal entry or a known license's name or alias. Both
//! are validated up front so that lookups during classification cannot fail.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LichenError, Result};
use crate::model::{ApprovedDependency, KnownLicense, ValidLicenseEntry};

/// Policy section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum PolicyConfig {
    Whitelist {
        #[serde(default)]
        valid_licenses: Vec<ValidLicenseItem>,
        #[serde(default)]
        approved_dependencies: Vec<ApprovedDependencyItem>,
        #[serde(default)]
        known_licenses: Vec<KnownLicense>,
    },
    Catalog {
        #[serde(default)]
        known_licenses: Vec<KnownLicense>,
    },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::Whitelist {
            valid_licenses: Vec::new(),
            approved_dependencies: Vec::new(),
            known_licenses: Vec::new(),
        }
    }
}

/// A valid license either as a bare name or as a `{ name, key }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidLicenseItem {
    Name(String),
    Entry(ValidLicenseEntry),
}

impl From<ValidLicenseItem> for ValidLicenseEntry {
    fn from(item: ValidLicenseItem) -> Self {
        match item {
            ValidLicenseItem::Name(name) => ValidLicenseEntry::new(name),
            ValidLicenseItem::Entry(entry) => entry,
        }
    }
}

/// An approved dependency either as a bare pattern or as an
/// `{ identifier, key }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApprovedDependencyItem {
    Pattern(String),
    Entry(ApprovedDependency),
}

impl From<ApprovedDependencyItem> for ApprovedDependency {
    fn from(item: ApprovedDependencyItem) -> Self {
        match item {
            ApprovedDependencyItem::Pattern(identifier) => ApprovedDependency::new(identifier),
            ApprovedDependencyItem::Entry(entry) => entry,
        }
    }
}

/// What a policy lookup matched. `license` is the known license the match
/// is linked to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LicenseMatch<'a> {
    pub license: Option<&'a KnownLicense>,
}

#[derive(Debug, Clone)]
struct Approval {
    pattern: Regex,
    source: String,
    license: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WhitelistPolicy {
    known: Vec<KnownLicense>,
    valid_licenses: Vec<(String, Option<usize>)>,
    approvals: Vec<Approval>,
}

#[derive(Debug, Clone)]
pub struct CatalogPolicy {
    known: Vec<KnownLicense>,
    approvals: Vec<Approval>,
}

#[derive(Debug, Clone)]
pub enum LicensePolicy {
    Whitelist(WhitelistPolicy),
    Catalog(CatalogPolicy),
}

impl LicensePolicy {
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        match config.clone() {
            PolicyConfig::Whitelist {
                valid_licenses,
                approved_dependencies,
                known_licenses,
            } => Self::whitelist(
                valid_licenses.into_iter().map(Into::into).collect(),
                approved_dependencies.into_iter().map(Into::into).collect(),
                known_licenses,
            ),
            PolicyConfig::Catalog { known_licenses } => Self::catalog(known_licenses),
        }
    }

    pub fn whitelist(
        valid_licenses: Vec<ValidLicenseEntry>,
        approved_dependencies: Vec<ApprovedDependency>,
        known_licenses: Vec<KnownLicense>,
    ) -> Result<Self> {
        check_known_licenses(&known_licenses)?;

        let mut valid = Vec::with_capacity(valid_licenses.len());
        for entry in valid_licenses {
            if entry.name.is_empty() {
                return Err(LichenError::Config(
                    "A valid license was found without a name.".to_string(),
                ));
            }
            let index = resolve_key(&known_licenses, entry.key.as_deref(), &entry.name)?;
            valid.push((entry.name, index));
        }

        let mut approvals = Vec::with_capacity(approved_dependencies.len());
        for approved in approved_dependencies {
            let index =
                resolve_key(&known_licenses, approved.key.as_deref(), &approved.identifier)?;
            approvals.push(compile_approval(&approved.identifier, index)?);
        }

        debug!(
            "Whitelist policy: {} valid name(s), {} approved pattern(s), {} known license(s)",
            valid.len(),
            approvals.len(),
            known_licenses.len()
        );
        Ok(Self::Whitelist(WhitelistPolicy {
            known: known_licenses,
            valid_licenses: valid,
            approvals,
        }))
    }

    pub fn catalog(known_licenses: Vec<KnownLicense>) -> Result<Self> {
        check_known_licenses(&known_licenses)?;

        let mut approvals = Vec::new();
        for (index, license) in known_licenses.iter().enumerate() {
            for pattern in &license.approved_dependencies {
                approvals.push(compile_approval(pattern, Some(index))?);
            }
        }

        debug!(
            "Catalog policy: {} known license(s), {} approved dependency pattern(s)",
            known_licenses.len(),
            approvals.len()
        );
        Ok(Self::Catalog(CatalogPolicy {
            known: known_licenses,
            approvals,
        }))
    }

    pub fn known_licenses(&self) -> &[KnownLicense] {
        match self {
            Self::Whitelist(p) => &p.known,
            Self::Catalog(p) => &p.known,
        }
    }

    /// Looks up an artifact identifier (`group:artifact:version`) among the
    /// approved dependency patterns. First match in declaration order wins.
    pub fn approved_dependency(&self, identifier: &str) -> Option<LicenseMatch<'_>> {
        let (known, approvals) = match self {
            Self::Whitelist(p) => (&p.known, &p.approvals),
            Self::Catalog(p) => (&p.known, &p.approvals),
        };
        approvals
            .iter()
            .find(|a| a.pattern.is_match(identifier))
            .map(|a| {
                debug!("'{}' approved by pattern '{}'", identifier, a.source);
                LicenseMatch {
                    license: a.license.map(|i| &known[i]),
                }
            })
    }

    /// Looks up a declared license name. A literal valid license wins over
    /// the names and aliases of the known licenses.
    pub fn declared_license(&self, name: &str) -> Option<LicenseMatch<'_>> {
        if name.is_empty() {
            return None;
        }
        let literal = match self {
            Self::Whitelist(p) => p
                .valid_licenses
                .iter()
                .find(|(valid, _)| valid == name)
                .map(|(_, index)| LicenseMatch {
                    license: index.map(|i| &p.known[i]),
                }),
            Self::Catalog(_) => None,
        };
        literal.or_else(|| {
            self.known_licenses()
                .iter()
                .find(|l| l.is_named(name))
                .map(|l| LicenseMatch { license: Some(l) })
        })
    }
}

fn check_known_licenses(known: &[KnownLicense]) -> Result<()> {
    for (i, license) in known.iter().enumerate() {
        if license.key.is_empty() {
            return Err(LichenError::Config(format!(
                "Known license '{}' has no key.",
                license.name
            )));
        }
        if known[..i].iter().any(|other| other.key == license.key) {
            return Err(LichenError::Config(format!(
                "Known license key '{}' is defined more than once.",
                license.key
            )));
        }
        if license.aliases.iter().any(String::is_empty) {
            return Err(LichenError::Config(format!(
                "An alias was found without identifier for known license '{}'.",
                license.key
            )));
        }
    }
    Ok(())
}

fn resolve_key(known: &[KnownLicense], key: Option<&str>, referrer: &str) -> Result<Option<usize>> {
    let Some(key) = key else {
        return Ok(None);
    };
    known
        .iter()
        .position(|l| l.key == key)
        .map(Some)
        .ok_or_else(|| {
            LichenError::Config(format!(
                "License key '{key}' referenced by '{referrer}' is not a known license."
            ))
        })
}

fn compile_approval(identifier: &str, license: Option<usize>) -> Result<Approval> {
    if identifier.is_empty() {
        return Err(LichenError::Config(
            "An approved dependency was found without identifier.".to_string(),
        ));
    }
    // Patterns must match the whole identifier.
    let pattern = Regex::new(&format!("^(?:{identifier})$")).map_err(|e| {
        LichenError::Config(format!(
            "Approved dependency pattern '{identifier}' is not a valid regular expression: {e}"
        ))
    })?;
    Ok(Approval {
        pattern,
        source: identifier.to_string(),
        license,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apache() -> KnownLicense {
        KnownLicense::new(
            "apache-2.0",
            "Apache License, Version 2.0",
            "https://www.apache.org/licenses/LICENSE-2.0",
        )
        .with_alias("Apache-2.0")
        .with_alias("The Apache Software License, Version 2.0")
    }

    #[test]
    fn whitelist_prefers_literal_names_over_known_licenses() {
        let policy = LicensePolicy::whitelist(
            vec![ValidLicenseEntry::new("Apache-2.0")],
            vec![],
            vec![apache()],
        )
        .unwrap();

        assert_eq!(
            policy.declared_license("Apache-2.0"),
            Some(LicenseMatch { license: None })
        );
        assert!(policy.declared_license("GPL-3.0").is_none());
        assert!(policy.declared_license("").is_none());
    }

    #[test]
    fn whitelist_falls_back_to_known_license_names_and_aliases() {
        let policy = LicensePolicy::whitelist(
            vec![ValidLicenseEntry::new("MIT")],
            vec![],
            vec![apache()],
        )
        .unwrap();

        for name in [
            "Apache-2.0",
            "Apache License, Version 2.0",
            "The Apache Software License, Version 2.0",
        ] {
            let m = policy.declared_license(name).unwrap();
            assert_eq!(m.license.map(|l| l.key.as_str()), Some("apache-2.0"));
        }
        assert_eq!(
            policy.declared_license("MIT"),
            Some(LicenseMatch { license: None })
        );
        assert!(policy.declared_license("GPL-3.0").is_none());
    }

    #[test]
    fn whitelist_entries_link_to_known_licenses() {
        let policy = LicensePolicy::whitelist(
            vec![ValidLicenseEntry::new("ASL 2").with_key("apache-2.0")],
            vec![ApprovedDependency::new(r"org\.internal:.*:.*").with_key("apache-2.0")],
            vec![apache()],
        )
        .unwrap();

        let m = policy.declared_license("ASL 2").unwrap();
        assert_eq!(m.license.map(|l| l.key.as_str()), Some("apache-2.0"));

        let m = policy.approved_dependency("org.internal:tool:1.0").unwrap();
        assert_eq!(m.license.map(|l| l.key.as_str()), Some("apache-2.0"));
    }

    #[test]
    fn catalog_matches_name_and_aliases() {
        let policy = LicensePolicy::catalog(vec![apache()]).unwrap();
        for name in [
            "Apache License, Version 2.0",
            "Apache-2.0",
            "The Apache Software License, Version 2.0",
        ] {
            let m = policy.declared_license(name).unwrap();
            assert_eq!(m.license.unwrap().key, "apache-2.0");
        }
        assert!(policy.declared_license("MIT").is_none());
    }

    #[test]
    fn approved_patterns_must_match_whole_identifier() {
        let policy = LicensePolicy::catalog(vec![
            apache().with_approved_dependency(r"org\.example:lib:1\..*")
        ])
        .unwrap();

        assert!(policy.approved_dependency("org.example:lib:1.2").is_some());
        assert!(policy.approved_dependency("xorg.example:lib:1.2").is_none());
        assert!(policy.approved_dependency("org.example:lib:2.0").is_none());
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let err = LicensePolicy::whitelist(
            vec![ValidLicenseEntry::new("MIT").with_key("mit")],
            vec![],
            vec![apache()],
        )
        .unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));

        let err = LicensePolicy::whitelist(
            vec![],
            vec![ApprovedDependency::new("a:b:c").with_key("missing")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));
    }

    #[test]
    fn empty_identifiers_are_configuration_errors() {
        let err = LicensePolicy::catalog(vec![apache().with_alias("")]).unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));

        let err = LicensePolicy::catalog(vec![apache().with_approved_dependency("")]).unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));

        let err = LicensePolicy::catalog(vec![apache().with_approved_dependency("(")]).unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));

        let err = LicensePolicy::catalog(vec![apache(), apache()]).unwrap_err();
        assert!(matches!(err, LichenError::Config(_)));
    }

    #[test]
    fn policy_config_accepts_both_styles() {
        let whitelist: PolicyConfig = toml::from_str(
            r#"
            style = "whitelist"
            valid_licenses = ["MIT", { name = "ASL 2", key = "apache-2.0" }]
            approved_dependencies = ['org\.internal:.*:.*']

            [[known_licenses]]
            key = "apache-2.0"
            name = "Apache License, Version 2.0"
            "#,
        )
        .unwrap();
        let policy = LicensePolicy::from_config(&whitelist).unwrap();
        assert!(matches!(policy, LicensePolicy::Whitelist(_)));
        assert!(policy.declared_license("MIT").is_some());
        assert!(policy.approved_dependency("org.internal:x:1").is_some());

        let catalog: PolicyConfig = toml::from_str(
            r#"
            style = "catalog"

            [[known_licenses]]
            key = "mit"
            name = "MIT License"
            aliases = ["MIT"]
            "#,
        )
        .unwrap();
        let policy = LicensePolicy::from_config(&catalog).unwrap();
        assert!(matches!(policy, LicensePolicy::Catalog(_)));
        assert_eq!(policy.known_licenses()[0].name, "MIT License");
        assert!(policy.declared_license("MIT").is_some());
    }
}
