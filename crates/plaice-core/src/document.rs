use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::node::{NodeTag, SceneNode};

slotmap::new_key_type! {
    /// Stable identifier of a node within its document.
    pub struct NodeId;
}

/// Arena-backed scene tree. Ownership of children is exclusive; `use`
/// aliases are weak references resolved through [`Document::referencing_use_nodes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    nodes: SlotMap<NodeId, SceneNode>,
    root: NodeId,
}

impl Document {
    pub fn new() -> Self {
        let mut nodes: SlotMap<NodeId, SceneNode> = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new(NodeTag::Group));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Creates a node under `parent` and returns its id.
    pub fn create_node(&mut self, parent: NodeId, tag: NodeTag) -> Result<NodeId> {
        let parent_tag = self.nodes.get(parent).ok_or(Error::NodeMissing)?.tag;
        if !parent_tag.is_container() {
            return Err(Error::NotAContainer { tag: parent_tag });
        }
        let id = self.nodes.insert(SceneNode::new(tag));
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Moves `child` under `parent`, detaching it from its current parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(Error::RootImmutable);
        }
        let parent_tag = self.nodes.get(parent).ok_or(Error::NodeMissing)?.tag;
        if !self.nodes.contains_key(child) {
            return Err(Error::NodeMissing);
        }
        if !parent_tag.is_container() {
            return Err(Error::NotAContainer { tag: parent_tag });
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::WouldCycle);
        }
        if let Some(old_parent) = self.nodes[child].parent {
            self.nodes[old_parent].children.retain(|&c| c != child);
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Removes `id` and its whole subtree. Aliases pointing into the removed
    /// subtree are cleared.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(Error::RootImmutable);
        }
        if !self.nodes.contains_key(id) {
            return Err(Error::NodeMissing);
        }
        if let Some(parent) = self.nodes[id].parent {
            self.nodes[parent].children.retain(|&c| c != id);
        }
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(cur) {
                stack.extend(node.children);
            }
        }
        let dangling: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.href.is_some_and(|t| !self.nodes.contains_key(t)))
            .map(|(k, _)| k)
            .collect();
        for k in dangling {
            self.nodes[k].href = None;
        }
        Ok(())
    }

    /// Points a `use` node at `target`.
    pub fn set_use_target(&mut self, use_node: NodeId, target: NodeId) -> Result<()> {
        let tag = self.nodes.get(use_node).ok_or(Error::NodeMissing)?.tag;
        if tag != NodeTag::Use {
            return Err(Error::NotAUse { tag });
        }
        if !self.nodes.contains_key(target) {
            return Err(Error::NodeMissing);
        }
        self.nodes[use_node].href = Some(target);
        Ok(())
    }

    /// Every `use` node in the document aliasing `target`. A reverse lookup,
    /// not a tree walk: alias edges must never be followed as children.
    pub fn referencing_use_nodes(&self, target: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.tag == NodeTag::Use && n.href == Some(target))
            .map(|(k, _)| k)
            .collect()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn is_ancestor(&self, node: NodeId, descendant: NodeId) -> bool {
        let mut current = Some(descendant);
        while let Some(id) = current {
            if id == node {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
