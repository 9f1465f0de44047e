// lichen-common/src/dependency/mod.rs
pub mod provider;
pub mod resolver;
pub mod tree;

pub use provider::{ArtifactMetadata, MetadataProvider};
pub use resolver::{
    BranchFailure, CycleReport, DependencyResolver, ResolutionContext, ResolveOptions,
    ResolvedTree,
};
pub use tree::{DependencyNode, DependencyTree, NodeId};
