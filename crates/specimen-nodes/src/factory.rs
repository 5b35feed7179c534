use std::collections::{HashMap, VecDeque};

use specimen_types::{Type, TypeDisplay, TypeStore};
use tracing::trace;

use crate::context::{NodeContext, OriginKey};
use crate::creator::NodeCreator;
use crate::error::NodeGraphError;
use crate::members::MemberCollector;
use crate::node::{NodeId, NodeTree};

/// Builds the complete node tree for a root type, breadth-first.
///
/// Each dequeued node is either terminal (cyclic, ignored, at the depth
/// limit, or pre-expanded) or promoted by attaching its children exactly
/// once. Children are produced in collection order so a fixed seed yields
/// an identical tree.
pub struct NodeFactory<'c, 'a> {
    ctx: &'c NodeContext<'a>,
}

impl<'c, 'a> NodeFactory<'c, 'a> {
    pub fn new(ctx: &'c NodeContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn create_root_node(&self, ty: &Type) -> Result<NodeTree, NodeGraphError> {
        let store = self.ctx.store();
        let creator = NodeCreator::new(self.ctx);
        let collector = MemberCollector::new(store, self.ctx.settings());
        let mut validator = OriginSelectorValidator::new(self.ctx);

        let mut tree = NodeTree::new();
        let root = creator
            .create_node(&mut tree, ty, None, None, None)?
            .ok_or_else(|| NodeGraphError::UnresolvedRoot {
                root: TypeDisplay::new(store, ty).to_string(),
            })?;
        tree.set_root(root);

        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(root);

        while let Some(id) = queue.pop_front() {
            let node = tree.node(id);
            if !node.is_cyclic() && node.children().is_empty() {
                validator.check_node(&tree, id)?;
                let children = self.create_children(&creator, &collector, &mut tree, id)?;
                tree.set_children(id, children);
                // The post-expansion hook inspects children by field name,
                // so it must run strictly after they are attached.
                for listener in self.ctx.listeners() {
                    listener.node_expanded(store, &tree, id);
                }
            }
            queue.extend(tree.node(id).children().iter().copied());
        }

        Ok(tree)
    }

    fn create_children(
        &self,
        creator: &NodeCreator<'c, 'a>,
        collector: &MemberCollector<'_>,
        tree: &mut NodeTree,
        id: NodeId,
    ) -> Result<Vec<NodeId>, NodeGraphError> {
        let node = tree.node(id);
        if node.is_ignored() {
            return Ok(Vec::new());
        }
        if node.depth() >= self.ctx.max_depth() {
            trace!(depth = node.depth(), "node at maximum depth, no children");
            return Ok(Vec::new());
        }

        if node.kind().is_container() {
            let slots = self.container_element_types(tree, id);
            let mut children = Vec::with_capacity(slots.len());
            for slot in &slots {
                // Container elements have no originating member: their
                // values are assigned via insertion, not field assignment.
                if let Some(child) = creator.create_node(tree, slot, None, None, Some(id))? {
                    children.push(child);
                }
            }
            Ok(children)
        } else {
            self.children_from_members(creator, collector, tree, id)
        }
    }

    /// The element "type slots" of a container node: the component type for
    /// arrays, the actual type arguments for parameterized containers, and
    /// for raw containers the target's formal parameters, falling back to
    /// the first parameterized superclass instantiation when the container
    /// subclasses a generic type without re-declaring parameters.
    fn container_element_types(&self, tree: &NodeTree, id: NodeId) -> Vec<Type> {
        let store = self.ctx.store();
        let node = tree.node(id);
        match node.declared() {
            Type::Array(component) => vec![(**component).clone()],
            Type::Class(ct) if !ct.args.is_empty() => ct.args.clone(),
            _ => {
                let Some(target) = node.target_class() else {
                    return Vec::new();
                };
                let formals = store
                    .class(target)
                    .map(|def| def.type_params.as_slice())
                    .unwrap_or_default();
                if formals.is_empty() {
                    generic_superclass_args(store, target)
                } else {
                    formals.iter().map(|v| Type::TypeVar(*v)).collect()
                }
            }
        }
    }

    fn children_from_members(
        &self,
        creator: &NodeCreator<'c, 'a>,
        collector: &MemberCollector<'_>,
        tree: &mut NodeTree,
        id: NodeId,
    ) -> Result<Vec<NodeId>, NodeGraphError> {
        let node = tree.node(id);
        let Some(target_class) = node.target_class() else {
            // Primitive and array targets carry no members.
            return Ok(Vec::new());
        };
        let data = collector.class_data(target_class, node.kind());

        let mut children = Vec::with_capacity(data.member_pairs.len());
        for pair in data.member_pairs {
            // The field's declared type wins over the setter's parameter
            // type: the field carries generic information the method
            // signature may have erased.
            let ty = pair.field.ty.clone();
            if let Some(child) =
                creator.create_node(tree, &ty, Some(pair.field), pair.setter, Some(id))?
            {
                children.push(child);
            }
        }
        for setter in data.unmatched_setters {
            let ty = setter.param.clone();
            if let Some(child) = creator.create_node(tree, &ty, None, Some(setter), Some(id))? {
                children.push(child);
            }
        }
        Ok(children)
    }
}

/// Type arguments of the first parameterized superclass instantiation,
/// e.g. `[String, Long]` for `CustomMap extends HashMap<String, Long>`.
fn generic_superclass_args(store: &TypeStore, class: specimen_types::ClassId) -> Vec<Type> {
    let mut current = Some(class);
    while let Some(id) = current {
        let Some(def) = store.class(id) else { break };
        match &def.super_class {
            Some(Type::Class(ct)) if !ct.args.is_empty() => return ct.args.clone(),
            other => current = other.as_ref().and_then(Type::class_id),
        }
    }
    Vec::new()
}

/// Checks that an origin selector does not match more than one node: with
/// two matches it is not clear which node's value a condition should be
/// evaluated against.
///
/// The check is best-effort. It is not guaranteed to cover all ambiguous
/// cases; an origin scoped inside a collection element, for instance, may
/// or may not be ambiguous depending on where its destination sits.
struct OriginSelectorValidator<'c, 'a> {
    ctx: &'c NodeContext<'a>,
    seen: HashMap<OriginKey, NodeId>,
}

impl<'c, 'a> OriginSelectorValidator<'c, 'a> {
    fn new(ctx: &'c NodeContext<'a>) -> Self {
        Self {
            ctx,
            seen: HashMap::new(),
        }
    }

    fn check_node(&mut self, tree: &NodeTree, id: NodeId) -> Result<(), NodeGraphError> {
        let Some(registry) = self.ctx.origin_registry() else {
            return Ok(());
        };
        let store = self.ctx.store();
        let keys = registry.origin_keys(store, &tree.node(id).query());

        for key in keys {
            if let Some(prev) = self.seen.insert(key.clone(), id) {
                return Err(NodeGraphError::AmbiguousOrigin {
                    origin: key.0,
                    first: tree.describe_with_ancestors(store, prev),
                    second: tree.describe_with_ancestors(store, id),
                });
            }
        }
        Ok(())
    }
}
