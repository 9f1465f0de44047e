// lichen-common/src/dependency/tree.rs
use std::collections::HashSet;

use crate::model::{ArtifactCoordinate, LicenseDeclaration};

/// Index of a node inside its [`DependencyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub coordinate: ArtifactCoordinate,
    pub licenses: Vec<LicenseDeclaration>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DependencyNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Resolved dependencies of a root artifact.
///
/// Nodes live in an arena owned by the tree. Parents own their children via
/// `children`; the `parent` link is a plain index used to walk the ancestor
/// chain.
#[derive(Debug, Clone)]
pub struct DependencyTree {
    nodes: Vec<DependencyNode>,
}

impl DependencyTree {
    pub fn new(root: ArtifactCoordinate, licenses: Vec<LicenseDeclaration>) -> Self {
        Self {
            nodes: vec![DependencyNode {
                coordinate: root,
                licenses,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        coordinate: ArtifactCoordinate,
        licenses: Vec<LicenseDeclaration>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode {
            coordinate,
            licenses,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The node itself followed by its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.nodes[current.0].parent)
    }

    /// Path from the root down to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count() - 1
    }

    pub fn max_depth(&self) -> usize {
        self.preorder().map(|id| self.depth(id)).max().unwrap_or(0)
    }

    /// All nodes in pre-order, root first.
    pub fn preorder(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![self.root()];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
            Some(id)
        })
    }

    /// Pre-order sequence of distinct coordinates, root excluded. The first
    /// occurrence of a coordinate wins; later occurrences are dropped.
    pub fn distinct_dependencies(&self) -> Vec<NodeId> {
        let root = self.root();
        let mut seen: HashSet<&ArtifactCoordinate> = HashSet::new();
        seen.insert(&self.node(root).coordinate);
        self.preorder()
            .filter(|&id| id != root && seen.insert(&self.nodes[id.0].coordinate))
            .collect()
    }
}
