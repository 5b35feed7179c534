use std::collections::HashMap;

use specimen_types::{upper_bound, Type, TypeStore};

use crate::context::RootType;

/// Per-node mapping from formal type parameters to resolved actual type
/// arguments.
///
/// Built once, from the node's declared type plus any "additional" mappings
/// supplied by subtype resolution (bridge maps) or generic superclass
/// instantiations. Keys are [`Type`] values, not just type variables: bridge
/// maps for substituted array components key entries by a raw class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTypeMap {
    map: HashMap<Type, Type>,
}

impl NodeTypeMap {
    /// Build the map for a node with the given declared type.
    ///
    /// Shapes a declared type can take and what they contribute:
    ///
    /// ```text
    ///   int                 -> nothing (no parameters)
    ///   Item                -> nothing (raw)
    ///   Item<Integer>       -> F -> Integer
    ///   Item<T>             -> F -> T (or the root mapping of T, if any)
    ///   T                   -> T -> root mapping of T, if any
    ///   Item<?>             -> F -> upper bound of the wildcard
    /// ```
    pub(crate) fn build(
        store: &TypeStore,
        declared: &Type,
        root: &RootType,
        additional: &HashMap<Type, Type>,
    ) -> Self {
        let mut map = additional.clone();

        match declared {
            Type::TypeVar(_) => {
                if let Some(mapped) = root.mapping(declared) {
                    map.insert(declared.clone(), mapped.clone());
                }
            }
            Type::Class(ct) if !ct.args.is_empty() => {
                let formals = store
                    .class(ct.def)
                    .map(|def| def.type_params.as_slice())
                    .unwrap_or_default();
                for (formal, arg) in formals.iter().zip(ct.args.iter()) {
                    // An argument that is itself an unmapped type variable
                    // stays variable-to-variable; an ancestor map resolves
                    // it later.
                    let mapped = resolve_type_mapping(store, root, arg).unwrap_or_else(|| arg.clone());
                    map.insert(Type::TypeVar(*formal), mapped);
                }
            }
            _ => {}
        }

        Self { map }
    }

    pub fn get(&self, ty: &Type) -> Option<&Type> {
        self.map.get(ty)
    }

    /// The mapped type, or `ty` itself when unmapped.
    pub fn get_or<'a>(&'a self, ty: &'a Type) -> &'a Type {
        self.map.get(ty).unwrap_or(ty)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Resolve a type argument to the value recorded in the node map.
///
/// Concrete shapes map to themselves; type variables go through the root
/// map; wildcards resolve through the first upper bound only.
fn resolve_type_mapping(store: &TypeStore, root: &RootType, ty: &Type) -> Option<Type> {
    match ty {
        Type::Class(_) | Type::Array(_) | Type::Primitive(_) => Some(ty.clone()),
        Type::TypeVar(_) => root.mapping(ty).cloned(),
        Type::Wildcard(bound) => resolve_type_mapping(store, root, &upper_bound(store, bound)),
    }
}
