use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};
use crate::node::{AttrMap, SceneNode};
use crate::transform::TransformList;

/// Captured attribute + transform state of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub attrs: AttrMap,
    pub transform: TransformList,
}

impl NodeSnapshot {
    pub fn of(node: &SceneNode) -> Self {
        Self {
            attrs: node.attrs.clone(),
            transform: node.transform.clone(),
        }
    }

    fn write_to(&self, node: &mut SceneNode) {
        node.attrs = self.attrs.clone();
        node.transform = self.transform.clone();
    }
}

/// Reversible diff of a single node's attributes and transform chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAttributesCommand {
    pub node: NodeId,
    pub before: NodeSnapshot,
    pub after: NodeSnapshot,
}

impl ChangeAttributesCommand {
    pub fn new(node: NodeId, before: NodeSnapshot, after: NodeSnapshot) -> Self {
        Self { node, before, after }
    }

    pub fn is_empty(&self) -> bool {
        self.before == self.after
    }

    pub fn apply_to(&self, doc: &mut Document) {
        if let Some(node) = doc.get_mut(self.node) {
            self.after.write_to(node);
        }
    }

    pub fn revert(&self, doc: &mut Document) {
        if let Some(node) = doc.get_mut(self.node) {
            self.before.write_to(node);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ChangeAttributes(ChangeAttributesCommand),
    Batch(BatchCommand),
}

impl Command {
    pub fn is_empty(&self) -> bool {
        match self {
            Command::ChangeAttributes(c) => c.is_empty(),
            Command::Batch(b) => b.is_empty(),
        }
    }

    fn apply_to(&self, doc: &mut Document) {
        match self {
            Command::ChangeAttributes(c) => c.apply_to(doc),
            Command::Batch(b) => b.apply_to(doc),
        }
    }

    fn revert(&self, doc: &mut Document) {
        match self {
            Command::ChangeAttributes(c) => c.revert(doc),
            Command::Batch(b) => b.revert(doc),
        }
    }
}

impl From<ChangeAttributesCommand> for Command {
    fn from(c: ChangeAttributesCommand) -> Self {
        Command::ChangeAttributes(c)
    }
}

impl From<BatchCommand> for Command {
    fn from(b: BatchCommand) -> Self {
        Command::Batch(b)
    }
}

/// Ordered batch of reversible edits, nestable per recursively processed
/// node. An empty batch must never reach the host's undo stack; callers use
/// [`BatchCommand::is_empty`] to suppress it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCommand {
    label: String,
    commands: Vec<Command>,
}

impl BatchCommand {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            commands: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Appends a sub-command, dropping `None` and observable no-ops.
    pub fn add_sub_command(&mut self, cmd: Option<Command>) {
        if let Some(cmd) = cmd {
            if !cmd.is_empty() {
                self.commands.push(cmd);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.iter().all(Command::is_empty)
    }

    /// Re-applies every recorded `after` state, in order.
    pub fn apply_to(&self, doc: &mut Document) {
        for cmd in &self.commands {
            cmd.apply_to(doc);
        }
    }

    /// Restores every recorded `before` state, in reverse order.
    pub fn revert(&self, doc: &mut Document) {
        for cmd in self.commands.iter().rev() {
            cmd.revert(doc);
        }
    }
}
