use std::collections::HashMap;

use specimen_types::{
    concrete_implementations, erase, is_assignable, upper_bound, ClassId, ClassKind, Type,
    TypeDisplay, TypeStore,
};
use tracing::{debug, trace};

use crate::context::{NodeContext, NodeQuery};
use crate::error::NodeGraphError;
use crate::kind::resolve_node_kind;
use crate::members::{FieldRef, SetterRef};
use crate::node::{Node, NodeId, NodeKind, NodeTree};
use crate::type_helper::TypeHelper;
use crate::type_map::NodeTypeMap;

/// Creates single nodes from type descriptors.
///
/// Nodes come out shallow (no children), except template-created ones which
/// are pre-expanded. A node may originate from a field, a setter, both, or
/// neither:
///
/// ```text
/// | node.field | node.setter |
/// |------------+-------------+---------------------------------------
/// | foo        | setFoo      | field/setter matched
/// | none       | setFoo      | unmatched setter
/// | foo        | none        | field without a setter
/// | none       | none        | container element, root
/// ```
pub(crate) struct NodeCreator<'c, 'a> {
    ctx: &'c NodeContext<'a>,
}

impl<'c, 'a> NodeCreator<'c, 'a> {
    pub(crate) fn new(ctx: &'c NodeContext<'a>) -> Self {
        Self { ctx }
    }

    fn store(&self) -> &'a TypeStore {
        self.ctx.store()
    }

    fn helper(&self) -> TypeHelper<'_> {
        TypeHelper::new(self.ctx.store(), self.ctx.root_type())
    }

    /// Create one node for `ty`, or `None` when the slot is pruned (depth
    /// limit, ignored member name, unresolvable type variable).
    pub(crate) fn create_node(
        &self,
        tree: &mut NodeTree,
        ty: &Type,
        field: Option<FieldRef>,
        setter: Option<SetterRef>,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, NodeGraphError> {
        let store = self.store();

        if let Some(p) = parent {
            if tree.node(p).depth() >= self.ctx.max_depth() {
                trace!(
                    max_depth = self.ctx.max_depth(),
                    "maximum depth reached, pruning subtree"
                );
                return Ok(None);
            }
        }

        let member_name = field
            .as_ref()
            .map(|f| f.name.as_str())
            .or_else(|| setter.as_ref().map(|s| s.name.as_str()));
        if let Some(name) = member_name {
            if self.ctx.settings().is_ignored_name(name) {
                trace!(member = name, "member matches an ignore pattern, pruning");
                return Ok(None);
            }
        }

        if let Some(id) = self.create_from_template(tree, ty, field.clone(), setter.clone(), parent)? {
            self.apply_ignore_predicate(tree, id);
            return Ok(Some(id));
        }

        let created = match ty {
            Type::Class(_) => Some(self.class_node(tree, ty, field, setter, parent)?),
            Type::TypeVar(_) => match self.helper().resolve_type_variable(tree, ty, parent) {
                Some(resolved) => {
                    return self.create_node(tree, &resolved, field, setter, parent);
                }
                None => {
                    trace!(
                        ty = %TypeDisplay::new(store, ty),
                        "unable to resolve type variable, pruning"
                    );
                    None
                }
            },
            Type::Wildcard(bound) => {
                let upper = upper_bound(store, bound);
                return self.create_node(tree, &upper, field, setter, parent);
            }
            Type::Array(component) => {
                self.array_node(tree, ty, component, field, setter, parent)?
            }
            Type::Primitive(_) => Some(self.leaf_node(tree, ty, field, setter, parent)),
        };

        if let Some(id) = created {
            self.apply_ignore_predicate(tree, id);
        }
        Ok(created)
    }

    /// Built-in table of generic-erasure types constructed via a static
    /// factory rather than member population. Matches are returned
    /// pre-expanded with a single child for the wrapped type argument.
    fn create_from_template(
        &self,
        tree: &mut NodeTree,
        ty: &Type,
        field: Option<FieldRef>,
        setter: Option<SetterRef>,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, NodeGraphError> {
        let store = self.store();
        let Type::Class(ct) = ty else {
            return Ok(None);
        };
        if ct.def != store.well_known().optional {
            return Ok(None);
        }

        let raw = Type::class(ct.def, vec![]);
        let node = Node {
            declared: ty.clone(),
            raw: raw.clone(),
            target: raw,
            field,
            setter,
            parent,
            children: Vec::new(),
            kind: NodeKind::Container,
            depth: parent.map_or(0, |p| tree.node(p).depth() + 1),
            cyclic: false,
            type_map: NodeTypeMap::build(store, ty, self.ctx.root_type(), &HashMap::new()),
        };
        let id = tree.push(node);

        // A raw instantiation carries no argument; the wrapped slot then
        // defaults to the object class.
        let element_ty = ct
            .args
            .first()
            .cloned()
            .unwrap_or_else(|| Type::class(store.well_known().object, vec![]));
        let child = self.create_node(tree, &element_ty, None, None, Some(id))?;
        tree.set_children(id, child.into_iter().collect());
        Ok(Some(id))
    }

    fn class_node(
        &self,
        tree: &mut NodeTree,
        declared: &Type,
        field: Option<FieldRef>,
        setter: Option<SetterRef>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, NodeGraphError> {
        let store = self.store();
        let Type::Class(ct) = declared else {
            unreachable!("class_node requires a class type");
        };
        let raw_class = ct.def;
        let raw = Type::class(raw_class, vec![]);
        let depth = parent.map_or(0, |p| tree.node(p).depth() + 1);

        // The candidate's own map, from the declared type alone; ancestor
        // back-inference reads it before the final map exists.
        let own_map = NodeTypeMap::build(store, declared, self.ctx.root_type(), &HashMap::new());

        let query = NodeQuery {
            target: &raw,
            declared,
            field_name: field.as_ref().map(|f| f.name.as_str()),
            setter_name: setter.as_ref().map(|s| s.name.as_str()),
            depth,
        };
        let target_class = self
            .resolve_subtype(tree, &query, raw_class, &own_map, parent)?
            .unwrap_or(raw_class);

        let helper = self.helper();
        // Enum substitutions are meaningless (constants, not subtypes) and
        // are dropped rather than validated.
        let substituted = target_class != raw_class
            && store.class(target_class).map(|def| def.kind) != Some(ClassKind::Enum);

        let (target_class, kind, additional) = if substituted {
            if !is_assignable(store, target_class, raw_class) {
                return Err(NodeGraphError::InvalidSubtype {
                    nominal: store.class_name(raw_class).to_string(),
                    subtype: store.class_name(target_class).to_string(),
                });
            }
            debug!(
                from = store.class_name(raw_class),
                to = store.class_name(target_class),
                "subtype mapping"
            );
            (
                target_class,
                resolve_node_kind(store, target_class),
                helper.create_bridge_type_map(raw_class, target_class),
            )
        } else {
            (
                raw_class,
                resolve_node_kind(store, raw_class),
                helper.create_superclass_type_map(raw_class),
            )
        };

        let target = Type::class(target_class, vec![]);
        let cyclic =
            kind.is_struct_like() && has_ancestor_with_same_target(tree, parent, &target, declared);

        let node = Node {
            declared: declared.clone(),
            raw,
            target,
            field,
            setter,
            parent,
            children: Vec::new(),
            kind,
            depth,
            cyclic,
            type_map: NodeTypeMap::build(store, declared, self.ctx.root_type(), &additional),
        };
        Ok(tree.push(node))
    }

    /// Resolve a replacement target class for a nominal type. Precedence,
    /// first match wins: per-selector override, static configuration table,
    /// provider chain, sealed-type random pick, ancestor type-map
    /// back-inference.
    fn resolve_subtype(
        &self,
        tree: &NodeTree,
        query: &NodeQuery<'_>,
        raw_class: ClassId,
        own_map: &NodeTypeMap,
        parent: Option<NodeId>,
    ) -> Result<Option<ClassId>, NodeGraphError> {
        let store = self.store();

        if let Some(id) = self.ctx.selector_subtype(query).and_then(|ty| ty.class_id()) {
            trace!(
                from = store.class_name(raw_class),
                to = store.class_name(id),
                "resolved subtype from selector"
            );
            return Ok(Some(id));
        }

        if let Some(id) = self.ctx.static_subtype(raw_class) {
            return Ok(Some(id));
        }

        for provider in self.ctx.providers() {
            let Some(id) = provider.resolve(store, raw_class) else {
                continue;
            };
            if !is_assignable(store, id, raw_class) {
                return Err(NodeGraphError::InvalidSubtype {
                    nominal: store.class_name(raw_class).to_string(),
                    subtype: store.class_name(id).to_string(),
                });
            }
            return Ok(Some(id));
        }

        if store.class(raw_class).is_some_and(|def| def.is_sealed()) {
            let impls = concrete_implementations(store, raw_class);
            if let Some(choice) = self.ctx.random().choose(&impls) {
                return Ok(Some(*choice));
            }
        }

        let raw = Type::class(raw_class, vec![]);
        Ok(self
            .subtype_from_ancestors(tree, own_map, parent, &raw)
            .and_then(|ty| ty.class_id()))
    }

    /// An earlier generic substitution may already have fixed this type:
    /// search the candidate's own map, then each ancestor's, for an entry
    /// keyed by the raw type.
    fn subtype_from_ancestors(
        &self,
        tree: &NodeTree,
        own_map: &NodeTypeMap,
        parent: Option<NodeId>,
        raw: &Type,
    ) -> Option<Type> {
        if let Some(mapped) = own_map.get(raw) {
            return erase(self.store(), mapped);
        }
        let mut next = parent;
        while let Some(id) = next {
            let node = tree.node(id);
            if let Some(mapped) = node.type_map().get(raw) {
                return erase(self.store(), mapped);
            }
            next = node.parent();
        }
        None
    }

    fn array_node(
        &self,
        tree: &mut NodeTree,
        declared: &Type,
        component: &Type,
        field: Option<FieldRef>,
        setter: Option<SetterRef>,
        parent: Option<NodeId>,
    ) -> Result<Option<NodeId>, NodeGraphError> {
        let store = self.store();

        let mut component = component.clone();
        if component.is_type_var() {
            match self.helper().resolve_type_variable(tree, &component, parent) {
                Some(resolved) => component = resolved,
                None => {
                    trace!("unable to resolve array component type, pruning");
                    return Ok(None);
                }
            }
        }
        let Some(raw_component) = erase(store, &component) else {
            trace!("array component does not erase to a concrete type, pruning");
            return Ok(None);
        };

        let raw = Type::array(raw_component.clone());
        let depth = parent.map_or(0, |p| tree.node(p).depth() + 1);
        let own_map = NodeTypeMap::build(store, declared, self.ctx.root_type(), &HashMap::new());

        let query = NodeQuery {
            target: &raw,
            declared,
            field_name: field.as_ref().map(|f| f.name.as_str()),
            setter_name: setter.as_ref().map(|s| s.name.as_str()),
            depth,
        };
        // An array is substituted as a whole, either via a selector
        // override or an ancestor map entry keyed by the raw array type;
        // the class-level sources cannot name an array.
        let substituted_component = self
            .ctx
            .selector_subtype(&query)
            .or_else(|| self.subtype_from_ancestors(tree, &own_map, parent, &raw))
            .and_then(|ty| match ty {
                Type::Array(tc) => erase(store, &tc),
                _ => None,
            });

        let mut target = raw.clone();
        let mut additional = HashMap::new();

        if let Some(target_component) = substituted_component {
            if target_component != raw_component && !raw_component.is_primitive() {
                if let (Some(sub), Some(sup)) =
                    (target_component.class_id(), raw_component.class_id())
                {
                    if !is_assignable(store, sub, sup) {
                        return Err(NodeGraphError::InvalidSubtype {
                            nominal: store.class_name(sup).to_string(),
                            subtype: store.class_name(sub).to_string(),
                        });
                    }
                    additional = self.helper().create_bridge_type_map(sup, sub);
                }
                debug!(
                    from = %TypeDisplay::new(store, &raw_component),
                    to = %TypeDisplay::new(store, &target_component),
                    "array component subtype mapping"
                );
                // Record the component substitution so the element node
                // picks it up through ancestor back-inference.
                additional.insert(raw_component.clone(), target_component.clone());
                target = Type::array(target_component);
            }
        }

        let node = Node {
            declared: declared.clone(),
            raw,
            target,
            field,
            setter,
            parent,
            children: Vec::new(),
            kind: NodeKind::Array,
            depth,
            cyclic: false,
            type_map: NodeTypeMap::build(store, declared, self.ctx.root_type(), &additional),
        };
        Ok(Some(tree.push(node)))
    }

    fn leaf_node(
        &self,
        tree: &mut NodeTree,
        ty: &Type,
        field: Option<FieldRef>,
        setter: Option<SetterRef>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let node = Node {
            declared: ty.clone(),
            raw: ty.clone(),
            target: ty.clone(),
            field,
            setter,
            parent,
            children: Vec::new(),
            kind: NodeKind::Default,
            depth: parent.map_or(0, |p| tree.node(p).depth() + 1),
            cyclic: false,
            type_map: NodeTypeMap::default(),
        };
        tree.push(node)
    }

    fn apply_ignore_predicate(&self, tree: &mut NodeTree, id: NodeId) {
        let query = tree.node(id).query();
        if self.ctx.is_ignored(&query) {
            tree.node_mut(id).kind = NodeKind::Ignored;
        }
    }
}

/// Cycle detection: a struct-like node whose (target, declared) pair
/// already occurs on the ancestor chain terminates its branch.
fn has_ancestor_with_same_target(
    tree: &NodeTree,
    parent: Option<NodeId>,
    target: &Type,
    declared: &Type,
) -> bool {
    let mut ancestor = parent;
    while let Some(id) = ancestor {
        let node = tree.node(id);
        if node.target() == target && node.declared() == declared {
            return true;
        }
        ancestor = node.parent();
    }
    false
}
