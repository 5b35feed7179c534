use std::collections::HashMap;

use specimen_types::{ClassId, Type, TypeStore};
use tracing::trace;

use crate::context::RootType;
use crate::node::{NodeId, NodeTree};

/// Helper for resolving type variables and building the auxiliary type maps
/// used during node creation.
pub(crate) struct TypeHelper<'a> {
    store: &'a TypeStore,
    root: &'a RootType,
}

impl<'a> TypeHelper<'a> {
    pub(crate) fn new(store: &'a TypeStore, root: &'a RootType) -> Self {
        Self { store, root }
    }

    /// Resolve a type variable to a concrete type by walking up through the
    /// ancestors of `parent`.
    ///
    /// At each step the root type-argument map is checked first (it holds
    /// arguments bound when the root itself was parameterized), then the
    /// ancestor's own map. The walk stops as soon as the mapping reaches
    /// anything other than a type variable. `None` means the variable is
    /// unresolvable; the caller skips the slot.
    pub(crate) fn resolve_type_variable(
        &self,
        tree: &NodeTree,
        var: &Type,
        parent: Option<NodeId>,
    ) -> Option<Type> {
        debug_assert!(var.is_type_var());

        let mut mapped = match parent {
            None => var.clone(),
            Some(p) => tree.node(p).type_map().get_or(var).clone(),
        };
        let mut ancestor = parent;

        while mapped.is_type_var() {
            let Some(current) = ancestor else { break };

            if let Some(root_mapped) = self.root.mapping(&mapped) {
                return Some(root_mapped.clone());
            }

            mapped = tree.node(current).type_map().get_or(&mapped).clone();

            if matches!(mapped, Type::Class(_)) {
                break;
            }
            ancestor = tree.node(current).parent();
        }

        if &mapped == var {
            trace!("unable to resolve type variable");
            None
        } else {
            Some(mapped)
        }
    }

    /// Map the formal parameters of every generic superclass instantiation
    /// in `class`'s hierarchy to the declared arguments.
    ///
    /// This handles `Child<T> extends Parent<T>`: a field inherited from
    /// `Parent` is declared against `Parent`'s variable, which must be
    /// translated into `Child`'s before normal resolution can proceed.
    pub(crate) fn create_superclass_type_map(&self, class: ClassId) -> HashMap<Type, Type> {
        let mut map = HashMap::new();
        let object = self.store.well_known().object;

        let mut current = Some(class);
        while let Some(id) = current {
            if id == object {
                break;
            }
            let Some(def) = self.store.class(id) else { break };
            if let Some(Type::Class(ct)) = &def.super_class {
                if !ct.args.is_empty() {
                    self.add_type_parameters(ct.def, &ct.args, &mut map);
                }
            }
            current = def.super_class.as_ref().and_then(Type::class_id);
        }

        if !map.is_empty() {
            trace!(entries = map.len(), "created superclass type map");
        }
        map
    }

    /// Bridge map translating a supertype's formal parameters to a
    /// subtype's after subtype mapping.
    ///
    /// Given `interface Supertype<A>` and `class Subtype<B> implements
    /// Supertype<B>`, the result maps `B -> A`, so fields declared against
    /// `A` still resolve once the subtype is substituted. Parameters are
    /// matched positionally when the counts agree; parameters fixed through
    /// the subtype's own generic superclass chain are added on top.
    pub(crate) fn create_bridge_type_map(
        &self,
        source: ClassId,
        target: ClassId,
    ) -> HashMap<Type, Type> {
        if source == target {
            return HashMap::new();
        }

        let mut map = HashMap::new();
        let (Some(source_def), Some(target_def)) =
            (self.store.class(source), self.store.class(target))
        else {
            return map;
        };

        if source_def.type_params.len() == target_def.type_params.len() {
            for (sub_param, sup_param) in target_def
                .type_params
                .iter()
                .zip(source_def.type_params.iter())
            {
                map.insert(Type::TypeVar(*sub_param), Type::TypeVar(*sup_param));
            }
        }

        // Parameters the subtype fixed via its own generic superclasses.
        map.extend(self.create_superclass_type_map(target));
        map
    }

    fn add_type_parameters(&self, class: ClassId, args: &[Type], map: &mut HashMap<Type, Type>) {
        let formals = self
            .store
            .class(class)
            .map(|def| def.type_params.as_slice())
            .unwrap_or_default();
        if formals.len() == args.len() {
            for (formal, arg) in formals.iter().zip(args.iter()) {
                map.insert(Type::TypeVar(*formal), arg.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specimen_types::{ClassDef, TypeStore};

    fn helper_fixture() -> (TypeStore, Type) {
        let store = TypeStore::with_minimal_jdk();
        let object_ty = Type::class(store.well_known().object, vec![]);
        (store, object_ty)
    }

    #[test]
    fn superclass_type_map_is_transitive() {
        let (mut store, object_ty) = helper_fixture();
        let string_ty = Type::class(store.well_known().string, vec![]);

        // class Top<A> ; class Mid<B> extends Top<B> ; class Leaf extends Mid<String>
        let a = store.add_type_param("A", vec![]);
        let top = store.add_class({
            let mut def = ClassDef::new("com.example.Top", Some(object_ty.clone()));
            def.type_params = vec![a];
            def
        });
        let b = store.add_type_param("B", vec![]);
        let mid = store.add_class({
            let mut def = ClassDef::new(
                "com.example.Mid",
                Some(Type::class(top, vec![Type::TypeVar(b)])),
            );
            def.type_params = vec![b];
            def
        });
        let leaf = store.add_class(ClassDef::new(
            "com.example.Leaf",
            Some(Type::class(mid, vec![string_ty.clone()])),
        ));

        let root = RootType::new(&store, object_ty);
        let helper = TypeHelper::new(&store, &root);
        let map = helper.create_superclass_type_map(leaf);

        assert_eq!(map.get(&Type::TypeVar(b)), Some(&string_ty));
        assert_eq!(map.get(&Type::TypeVar(a)), Some(&Type::TypeVar(b)));
    }

    #[test]
    fn bridge_map_matches_parameters_positionally() {
        let (mut store, object_ty) = helper_fixture();

        let a = store.add_type_param("A", vec![]);
        let supertype = store.add_class({
            let mut def = ClassDef::new("com.example.Supertype", Some(object_ty.clone()));
            def.type_params = vec![a];
            def
        });
        let b = store.add_type_param("B", vec![]);
        let subtype = store.add_class({
            let mut def = ClassDef::new("com.example.Subtype", Some(object_ty.clone()));
            def.type_params = vec![b];
            def.interfaces = vec![Type::class(supertype, vec![Type::TypeVar(b)])];
            def
        });

        let root = RootType::new(&store, object_ty);
        let helper = TypeHelper::new(&store, &root);
        let map = helper.create_bridge_type_map(supertype, subtype);

        assert_eq!(map.get(&Type::TypeVar(b)), Some(&Type::TypeVar(a)));
        assert!(helper.create_bridge_type_map(supertype, supertype).is_empty());
    }
}
