use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use specimen_types::{ClassId, Type, TypeDisplay, TypeStore};

use crate::context::NodeQuery;
use crate::members::{FieldRef, SetterRef};
use crate::type_map::NodeTypeMap;

/// Index of a [`Node`] inside a [`NodeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of a node, driving how children are produced for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf or plain struct-like class, including opaque platform types.
    Default,
    Array,
    Collection,
    Map,
    /// Immutable struct whose fields cannot be reassigned after construction.
    Record,
    /// Generic type-argument-driven container, e.g. optional-like wrappers.
    Container,
    /// Explicitly excluded; always childless, kept in the tree for
    /// traceability.
    Ignored,
}

impl NodeKind {
    /// Containers get their children from type-argument slots rather than
    /// members.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Array | NodeKind::Collection | NodeKind::Map | NodeKind::Container
        )
    }

    /// Struct-like kinds are populated via members and participate in cycle
    /// detection.
    pub fn is_struct_like(self) -> bool {
        matches!(self, NodeKind::Default | NodeKind::Record)
    }
}

/// One slot in the population plan.
///
/// Immutable after construction except for the single promotion from
/// "shallow" to "expanded" when the factory attaches its children.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) declared: Type,
    pub(crate) raw: Type,
    pub(crate) target: Type,
    pub(crate) field: Option<FieldRef>,
    pub(crate) setter: Option<SetterRef>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) depth: usize,
    pub(crate) cyclic: bool,
    pub(crate) type_map: NodeTypeMap,
}

impl Node {
    /// The type as declared at this slot, possibly generic.
    pub fn declared(&self) -> &Type {
        &self.declared
    }

    /// Erasure of the declared type. Without subtype mapping this equals
    /// [`Node::target`].
    pub fn raw(&self) -> &Type {
        &self.raw
    }

    /// The resolved target type this slot will be populated with.
    pub fn target(&self) -> &Type {
        &self.target
    }

    /// The target class when the target is a class type.
    pub fn target_class(&self) -> Option<ClassId> {
        self.target.class_id()
    }

    pub fn field(&self) -> Option<&FieldRef> {
        self.field.as_ref()
    }

    pub fn setter(&self) -> Option<&SetterRef> {
        self.setter.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn is_ignored(&self) -> bool {
        self.kind == NodeKind::Ignored
    }

    pub fn type_map(&self) -> &NodeTypeMap {
        &self.type_map
    }

    /// The view of this node handed to external callbacks.
    pub fn query(&self) -> NodeQuery<'_> {
        NodeQuery {
            target: &self.target,
            declared: &self.declared,
            field_name: self.field.as_ref().map(|f| f.name.as_str()),
            setter_name: self.setter.as_ref().map(|s| s.name.as_str()),
            depth: self.depth,
        }
    }

    /// Name of the member this node originates from, if any.
    pub fn member_name(&self) -> Option<&str> {
        self.field
            .as_ref()
            .map(|f| f.name.as_str())
            .or_else(|| self.setter.as_ref().map(|s| s.name.as_str()))
    }
}

// Depth is part of node identity: two structurally identical nodes at
// different depths must not compare equal, or cycle checks would
// short-circuit across unrelated branches.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.declared == other.declared
            && self.field == other.field
            && self.setter == other.setter
            && self.depth == other.depth
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state);
        self.declared.hash(state);
        self.field.hash(state);
        self.setter.hash(state);
        self.depth.hash(state);
    }
}

/// Summary numbers over a completed tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeStats {
    pub total_nodes: usize,
    /// Maximum depth of any node; 0 for a single-node tree.
    pub height: usize,
}

/// The completed population plan: a flat arena of nodes addressed by
/// [`NodeId`], with parent/child links stored as indices.
#[derive(Clone, Debug)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl NodeTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// Promote a shallow node to expanded. Children are attached exactly
    /// once.
    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        let node = &mut self.nodes[id.index()];
        debug_assert!(node.children.is_empty(), "children attached twice");
        node.children = children;
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// The node's sole child.
    ///
    /// Panics when the child count is anything other than one; callers use
    /// this only on nodes whose kind guarantees a single child, so a
    /// mismatch is a defect in this crate.
    pub fn only_child(&self, id: NodeId) -> NodeId {
        let children = self.node(id).children();
        assert!(
            children.len() == 1,
            "expected exactly one child, but found {}",
            children.len()
        );
        children[0]
    }

    pub fn stats(&self) -> NodeStats {
        NodeStats {
            total_nodes: self.nodes.len(),
            height: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }

    /// Compact one-line description of a node, for logs and errors.
    pub fn describe(&self, store: &TypeStore, id: NodeId) -> String {
        let node = self.node(id);
        if node.is_ignored() {
            return "Node[ignored]".to_string();
        }
        let name = match (node.member_name(), node.parent) {
            (Some(member), Some(parent)) => {
                let owner = self.node(parent).target();
                format!("{}.{}", TypeDisplay::new(store, owner), member)
            }
            _ => TypeDisplay::new(store, node.target()).to_string(),
        };
        format!(
            "Node[{}, depth={}, type={}]",
            name,
            node.depth,
            TypeDisplay::new(store, node.declared())
        )
    }

    /// Description of a node followed by its ancestor chain, used in the
    /// ambiguous-origin error.
    pub fn describe_with_ancestors(&self, store: &TypeStore, id: NodeId) -> String {
        let mut out = self.describe(store, id);
        let mut current = self.node(id).parent();
        while let Some(parent) = current {
            let _ = write!(out, "\n       -> {}", self.describe(store, parent));
            current = self.node(parent).parent();
        }
        out
    }

    /// Indented textual rendering of the whole tree, children in order.
    pub fn render(&self, store: &TypeStore) -> String {
        let mut out = String::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            for _ in 0..node.depth {
                out.push_str("  ");
            }
            out.push_str(&self.display_node(store, id));
            out.push('\n');
            for &child in node.children().iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Short display form: `field Person.name` or `class Person`.
    pub fn display_node(&self, store: &TypeStore, id: NodeId) -> String {
        let node = self.node(id);
        if node.is_ignored() {
            return "ignored".to_string();
        }
        match (node.member_name(), node.parent) {
            (Some(member), Some(parent)) => {
                let owner = self.node(parent).target();
                format!("field {}.{}", TypeDisplay::new(store, owner), member)
            }
            _ => format!("class {}", TypeDisplay::new(store, node.declared())),
        }
    }
}
