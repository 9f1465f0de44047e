// lichen-common/src/model/license.rs
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A license as declared in an artifact's own metadata. Not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LicenseDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The declared name, `None` when absent or empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A license the organization knows about, with the names it is declared
/// under and the artifacts approved under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownLicense {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    /// Regular expressions over `group:artifact:version`, full match.
    #[serde(default)]
    pub approved_dependencies: Vec<String>,
}

impl KnownLicense {
    pub fn new(key: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
            aliases: BTreeSet::new(),
            approved_dependencies: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn with_approved_dependency(mut self, pattern: impl Into<String>) -> Self {
        self.approved_dependencies.push(pattern.into());
        self
    }

    /// True if `declared` is the canonical name or one of the aliases.
    pub fn is_named(&self, declared: &str) -> bool {
        self.name == declared || self.aliases.contains(declared)
    }
}

impl fmt::Display for KnownLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Whitelist entry: a literal declared license name that is valid,
/// optionally linked to a known license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidLicenseEntry {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl ValidLicenseEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Whitelist entry: an artifact identifier pattern exempted from requiring
/// a license declaration, optionally linked to a known license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedDependency {
    pub identifier: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl ApprovedDependency {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}
