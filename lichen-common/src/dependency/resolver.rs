// lichen-common/src/dependency/resolver.rs
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::provider::MetadataProvider;
use super::tree::{DependencyTree, NodeId};
use crate::error::{LichenError, Result};
use crate::model::ArtifactCoordinate;

// --- ResolveOptions ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Expand dependencies of dependencies. When false only the root's
    /// direct dependencies are attached.
    pub recursive: bool,
    pub skip_test_scope: bool,
    pub skip_provided_scope: bool,
    pub skip_optionals: bool,
    /// Compare scope too when looking for an artifact among its ancestors.
    pub cycle_includes_scope: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            skip_test_scope: true,
            skip_provided_scope: true,
            skip_optionals: true,
            cycle_includes_scope: false,
        }
    }
}

// --- ResolutionContext ---
pub struct ResolutionContext<'a> {
    pub provider: &'a dyn MetadataProvider,
    pub options: ResolveOptions,
}

impl ResolutionContext<'_> {
    /// Why a declared dependency is left out of the tree, if it is.
    fn skip_reason(&self, dependency: &ArtifactCoordinate) -> Option<&'static str> {
        if self.options.skip_test_scope && dependency.is_test_scope() {
            return Some("test scope is skipped");
        }
        if self.options.skip_provided_scope && dependency.is_provided_scope() {
            return Some("provided scope is skipped");
        }
        if self.options.skip_optionals && dependency.optional {
            return Some("optional is skipped");
        }
        None
    }

    fn same_node(&self, a: &ArtifactCoordinate, b: &ArtifactCoordinate) -> bool {
        if self.options.cycle_includes_scope {
            a == b
        } else {
            a.same_artifact(b)
        }
    }
}

/// A dependency that was not expanded because it already appears among the
/// ancestors of the node declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Root first, ending with the node that declared the dependency.
    pub path: Vec<ArtifactCoordinate>,
    pub repeated: ArtifactCoordinate,
}

/// A dependency whose metadata could not be loaded; its branch is omitted.
#[derive(Debug, Clone)]
pub struct BranchFailure {
    pub coordinate: ArtifactCoordinate,
    pub requested_by: ArtifactCoordinate,
    pub error: LichenError,
}

#[derive(Debug, Clone)]
pub struct ResolvedTree {
    pub tree: DependencyTree,
    pub cycles: Vec<CycleReport>,
    pub failures: Vec<BranchFailure>,
}

pub struct DependencyResolver<'a> {
    context: ResolutionContext<'a>,
    cycles: Vec<CycleReport>,
    failures: Vec<BranchFailure>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(context: ResolutionContext<'a>) -> Self {
        Self {
            context,
            cycles: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Builds the dependency tree of `root`. Fails only if the root's own
    /// metadata cannot be loaded.
    pub fn resolve(&mut self, root: &ArtifactCoordinate) -> Result<ResolvedTree> {
        debug!(
            "Starting dependency resolution for '{}' ({:?})",
            root, self.context.options
        );
        self.cycles.clear();
        self.failures.clear();

        let metadata = self.context.provider.lookup(root).map_err(|e| {
            LichenError::Resolution(format!(
                "Could not load metadata of root artifact '{root}': {e}"
            ))
        })?;

        let mut tree = DependencyTree::new(root.clone(), metadata.licenses);
        let root_id = tree.root();
        self.resolve_recursive(&mut tree, root_id, metadata.dependencies, 0);

        debug!(
            "Resolved {} node(s), {} cycle(s) suppressed, {} branch(es) failed",
            tree.len(),
            self.cycles.len(),
            self.failures.len()
        );
        Ok(ResolvedTree {
            tree,
            cycles: std::mem::take(&mut self.cycles),
            failures: std::mem::take(&mut self.failures),
        })
    }

    /// Attach the declared `dependencies` of `node` and recurse into them.
    fn resolve_recursive(
        &mut self,
        tree: &mut DependencyTree,
        node: NodeId,
        dependencies: Vec<ArtifactCoordinate>,
        depth: usize,
    ) {
        if depth > 0 && !self.context.options.recursive {
            return;
        }

        for dependency in dependencies {
            let prefix = format!("{}\\-> {}", indentation(depth), dependency);
            debug!("{}", prefix);

            if let Some(reason) = self.context.skip_reason(&dependency) {
                debug!("{} >> {}", prefix, reason);
                continue;
            }

            // -------- cycle guard -------------------------------------------------------
            if self.has_cycle(tree, node, &dependency) {
                debug!("{} >> cycle found and needs to be skipped", prefix);
                continue;
            }

            match self.context.provider.lookup(&dependency) {
                Ok(metadata) => {
                    let child = tree.add_child(node, dependency, metadata.licenses);
                    self.resolve_recursive(tree, child, metadata.dependencies, depth + 1);
                }
                Err(e) => {
                    let requested_by = tree.node(node).coordinate.clone();
                    warn!(
                        "Could not load artifacts recursively. For artifact '{}' (required by '{}') the metadata lookup failed: {}",
                        dependency, requested_by, e
                    );
                    self.failures.push(BranchFailure {
                        coordinate: dependency,
                        requested_by,
                        error: e,
                    });
                }
            }
        }
    }

    fn has_cycle(
        &mut self,
        tree: &DependencyTree,
        node: NodeId,
        dependency: &ArtifactCoordinate,
    ) -> bool {
        let repeats = tree
            .ancestors(node)
            .any(|id| self.context.same_node(&tree.node(id).coordinate, dependency));
        if !repeats {
            return false;
        }

        let path: Vec<ArtifactCoordinate> = tree
            .path_to(node)
            .into_iter()
            .map(|id| tree.node(id).coordinate.clone())
            .collect();

        warn!("WARNING! Cycle detected for '{}':", dependency);
        for (i, coordinate) in path.iter().enumerate() {
            warn!("{}\\-> {}", indentation(i), coordinate);
        }
        warn!(" !! {}\\-> {} !! ", indentation(path.len()), dependency);

        self.cycles.push(CycleReport {
            path,
            repeated: dependency.clone(),
        });
        true
    }
}

fn indentation(depth: usize) -> String {
    "    ".repeat(depth)
}
