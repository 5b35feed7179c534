use std::collections::HashMap;

use crate::{ClassDef, ClassId, ClassKind, Type, TypeParamDef, TypeVarId};

/// Classes every store exposes by id, without requiring name lookups.
///
/// The node engine needs `object` (walk cutoff, wildcard bounds), `string`
/// and the boxed scalars (leaf classification), and the container roots
/// (collection/map/optional classification).
#[derive(Clone, Copy, Debug)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub boolean: ClassId,
    pub character: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub array_list: ClassId,
    pub set: ClassId,
    pub hash_set: ClassId,
    pub map: ClassId,
    pub hash_map: ClassId,
    pub optional: ClassId,
}

/// Registry of class metadata and formal type parameters.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownTypes,
}

impl TypeStore {
    /// A store seeded with a minimal standard model: the object root,
    /// string, boxed scalars, the collection/map hierarchy, and optional.
    pub fn with_minimal_jdk() -> Self {
        let mut classes = Vec::new();
        let mut type_params = Vec::new();
        let mut by_name = HashMap::new();

        let add = |classes: &mut Vec<ClassDef>,
                   by_name: &mut HashMap<String, ClassId>,
                   def: ClassDef|
         -> ClassId {
            let id = ClassId(classes.len() as u32);
            by_name.insert(def.name.clone(), id);
            classes.push(def);
            id
        };

        let add_param = |type_params: &mut Vec<TypeParamDef>, name: &str| -> TypeVarId {
            let id = TypeVarId(type_params.len() as u32);
            type_params.push(TypeParamDef {
                name: name.to_string(),
                upper_bounds: Vec::new(),
            });
            id
        };

        let object = add(
            &mut classes,
            &mut by_name,
            ClassDef::new("java.lang.Object", None),
        );
        let object_ty = Type::class(object, vec![]);

        let leaf = |classes: &mut Vec<ClassDef>,
                    by_name: &mut HashMap<String, ClassId>,
                    name: &str|
         -> ClassId {
            add(classes, by_name, ClassDef::new(name, Some(object_ty.clone())))
        };

        let string = leaf(&mut classes, &mut by_name, "java.lang.String");
        let boolean = leaf(&mut classes, &mut by_name, "java.lang.Boolean");
        let character = leaf(&mut classes, &mut by_name, "java.lang.Character");
        let byte = leaf(&mut classes, &mut by_name, "java.lang.Byte");
        let short = leaf(&mut classes, &mut by_name, "java.lang.Short");
        let integer = leaf(&mut classes, &mut by_name, "java.lang.Integer");
        let long = leaf(&mut classes, &mut by_name, "java.lang.Long");
        let float = leaf(&mut classes, &mut by_name, "java.lang.Float");
        let double = leaf(&mut classes, &mut by_name, "java.lang.Double");

        let collection_e = add_param(&mut type_params, "E");
        let collection = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.Collection", None);
            def.kind = ClassKind::Interface;
            def.is_abstract = true;
            def.type_params = vec![collection_e];
            def
        });

        let list_e = add_param(&mut type_params, "E");
        let list = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.List", None);
            def.kind = ClassKind::Interface;
            def.is_abstract = true;
            def.type_params = vec![list_e];
            def.interfaces = vec![Type::class(collection, vec![Type::TypeVar(list_e)])];
            def
        });

        let array_list_e = add_param(&mut type_params, "E");
        let array_list = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.ArrayList", Some(object_ty.clone()));
            def.type_params = vec![array_list_e];
            def.interfaces = vec![Type::class(list, vec![Type::TypeVar(array_list_e)])];
            def
        });

        let set_e = add_param(&mut type_params, "E");
        let set = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.Set", None);
            def.kind = ClassKind::Interface;
            def.is_abstract = true;
            def.type_params = vec![set_e];
            def.interfaces = vec![Type::class(collection, vec![Type::TypeVar(set_e)])];
            def
        });

        let hash_set_e = add_param(&mut type_params, "E");
        let hash_set = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.HashSet", Some(object_ty.clone()));
            def.type_params = vec![hash_set_e];
            def.interfaces = vec![Type::class(set, vec![Type::TypeVar(hash_set_e)])];
            def
        });

        let map_k = add_param(&mut type_params, "K");
        let map_v = add_param(&mut type_params, "V");
        let map = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.Map", None);
            def.kind = ClassKind::Interface;
            def.is_abstract = true;
            def.type_params = vec![map_k, map_v];
            def
        });

        let hash_map_k = add_param(&mut type_params, "K");
        let hash_map_v = add_param(&mut type_params, "V");
        let hash_map = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.HashMap", Some(object_ty.clone()));
            def.type_params = vec![hash_map_k, hash_map_v];
            def.interfaces = vec![Type::class(
                map,
                vec![Type::TypeVar(hash_map_k), Type::TypeVar(hash_map_v)],
            )];
            def
        });

        let optional_t = add_param(&mut type_params, "T");
        let optional = add(&mut classes, &mut by_name, {
            let mut def = ClassDef::new("java.util.Optional", Some(object_ty));
            def.type_params = vec![optional_t];
            def
        });

        Self {
            classes,
            type_params,
            by_name,
            well_known: WellKnownTypes {
                object,
                string,
                boolean,
                character,
                byte,
                short,
                integer,
                long,
                float,
                double,
                collection,
                list,
                array_list,
                set,
                hash_set,
                map,
                hash_map,
                optional,
            },
        }
    }

    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    /// Register a class. The qualified name must be unique within the store.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        assert!(
            !self.by_name.contains_key(&def.name),
            "class '{}' is already registered",
            def.name
        );
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    /// Allocate a formal type parameter.
    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
        });
        id
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.index())
    }

    /// Qualified name of a class, or a placeholder for a dangling id.
    pub fn class_name(&self, id: ClassId) -> &str {
        self.class(id).map_or("<unknown>", |def| def.name.as_str())
    }
}
