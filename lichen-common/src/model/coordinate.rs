// lichen-common/src/model/coordinate.rs
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LichenError, Result};

const DEFAULT_TYPE: &str = "jar";

/// Declared usage context of a dependency, kept as written in the metadata.
/// Well-known scope names are recognised case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub const TEST: &'static str = "test";
    pub const PROVIDED: &'static str = "provided";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_test(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::TEST)
    }

    pub fn is_provided(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::PROVIDED)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// An empty scope string means no scope was declared.
fn declared_scope<'de, D>(deserializer: D) -> std::result::Result<Option<Scope>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(Scope))
}

/// Identity of a dependency as declared in a module's metadata.
///
/// Equality and hashing cover group, artifact, version, classifier, type and
/// scope. The `optional` flag only affects filtering during resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default, deserialize_with = "declared_scope")]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub optional: bool,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl ArtifactCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            kind: default_type(),
            scope: None,
            optional: false,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.as_str().is_empty()).then_some(scope);
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = (!classifier.is_empty()).then_some(classifier);
        self
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// `group:artifact:version`, the string approved-dependency patterns are
    /// matched against.
    pub fn identifier(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    pub fn classifier_str(&self) -> &str {
        self.classifier.as_deref().unwrap_or("")
    }

    pub fn scope_str(&self) -> &str {
        self.scope.as_ref().map_or("", Scope::as_str)
    }

    pub fn is_test_scope(&self) -> bool {
        self.scope.as_ref().is_some_and(Scope::is_test)
    }

    pub fn is_provided_scope(&self) -> bool {
        self.scope.as_ref().is_some_and(Scope::is_provided)
    }

    /// Identity without scope. Two coordinates with the same graph key refer
    /// to the same node of the dependency graph.
    pub fn graph_key(&self) -> (&str, &str, &str, &str, &str) {
        (
            &self.group_id,
            &self.artifact_id,
            &self.version,
            self.classifier_str(),
            &self.kind,
        )
    }

    pub fn same_artifact(&self, other: &Self) -> bool {
        self.graph_key() == other.graph_key()
    }
}

impl PartialEq for ArtifactCoordinate {
    fn eq(&self, other: &Self) -> bool {
        self.graph_key() == other.graph_key() && self.scope == other.scope
    }
}

impl Eq for ArtifactCoordinate {}

impl Hash for ArtifactCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph_key().hash(state);
        self.scope.hash(state);
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{} ({})",
            self.group_id,
            self.artifact_id,
            self.version,
            self.classifier_str(),
            self.kind,
            self.scope_str()
        )
    }
}

/// Parses `group:artifact:version[:type[:classifier]]`.
impl FromStr for ArtifactCoordinate {
    type Err = LichenError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(3..=5).contains(&parts.len()) || parts[..3].iter().any(|p| p.is_empty()) {
            return Err(LichenError::ParseError(
                "artifact coordinate",
                format!("expected 'group:artifact:version[:type[:classifier]]', got '{s}'"),
            ));
        }
        let mut coordinate = ArtifactCoordinate::new(parts[0], parts[1], parts[2]);
        if let Some(kind) = parts.get(3).filter(|k| !k.is_empty()) {
            coordinate.kind = kind.to_string();
        }
        if let Some(classifier) = parts.get(4) {
            coordinate = coordinate.with_classifier(*classifier);
        }
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn equality_includes_scope_but_not_optional() {
        let compile = ArtifactCoordinate::new("org.a", "b", "1.0").with_scope("compile");
        let test = ArtifactCoordinate::new("org.a", "b", "1.0").with_scope("test");
        let optional = compile.clone().optional(true);

        assert_ne!(compile, test);
        assert_eq!(compile, optional);
        assert!(compile.same_artifact(&test));

        let set: HashSet<_> = [compile, test, optional].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn identifier_and_display() {
        let c = ArtifactCoordinate::new("org.a", "b", "1.0")
            .with_classifier("sources")
            .with_scope("runtime");
        assert_eq!(c.identifier(), "org.a:b:1.0");
        assert_eq!(c.to_string(), "org.a:b:1.0:sources:jar (runtime)");
    }

    #[test]
    fn parses_cli_coordinates() {
        let c: ArtifactCoordinate = "org.a:b:1.0".parse().unwrap();
        assert_eq!(c.kind, "jar");
        assert_eq!(c.classifier, None);

        let c: ArtifactCoordinate = "org.a:b:1.0:pom:tests".parse().unwrap();
        assert_eq!(c.kind, "pom");
        assert_eq!(c.classifier.as_deref(), Some("tests"));

        assert!("org.a:b".parse::<ArtifactCoordinate>().is_err());
        assert!("org.a::1.0".parse::<ArtifactCoordinate>().is_err());
    }

    #[test]
    fn scope_keeps_declared_text() {
        let upper = Scope::from("TEST");
        assert!(upper.is_test());
        assert_eq!(upper.as_str(), "TEST");
        assert!(Scope::from("Provided").is_provided());
        assert_eq!(Scope::from("weird").as_str(), "weird");

        let c = ArtifactCoordinate::new("org.a", "b", "1.0").with_scope("TEST");
        assert!(c.is_test_scope());
        assert_eq!(c.scope_str(), "TEST");
    }

    #[test]
    fn empty_scope_is_no_scope() {
        let declared: ArtifactCoordinate = serde_json::from_str(
            r#"{ "group_id": "org.a", "artifact_id": "b", "version": "1.0", "scope": "" }"#,
        )
        .unwrap();
        let absent: ArtifactCoordinate =
            serde_json::from_str(r#"{ "group_id": "org.a", "artifact_id": "b", "version": "1.0" }"#)
                .unwrap();
        assert_eq!(declared.scope, None);
        assert_eq!(declared, absent);

        let built = ArtifactCoordinate::new("org.a", "b", "1.0").with_scope("");
        assert_eq!(built, absent);
    }
}
