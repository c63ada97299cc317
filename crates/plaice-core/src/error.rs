use crate::node::NodeTag;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors from document edits. The normalization engine itself
/// never fails; every degenerate input degrades to "leave unchanged".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node is not part of this document")]
    NodeMissing,

    #[error("{tag:?} nodes cannot have children")]
    NotAContainer { tag: NodeTag },

    #[error("only `use` nodes can alias another node, got {tag:?}")]
    NotAUse { tag: NodeTag },

    #[error("reparenting would create a cycle")]
    WouldCycle,

    #[error("the document root cannot be moved or removed")]
    RootImmutable,
}
