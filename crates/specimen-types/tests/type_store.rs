use pretty_assertions::assert_eq;
use specimen_types::{
    concrete_implementations, erase, is_assignable, ClassDef, ClassKind, FieldDef, Type, TypeStore,
};

#[test]
fn minimal_jdk_defines_container_hierarchy() {
    let store = TypeStore::with_minimal_jdk();
    let wk = *store.well_known();

    assert_eq!(store.class_id("java.util.ArrayList"), Some(wk.array_list));
    assert!(is_assignable(&store, wk.array_list, wk.list));
    assert!(is_assignable(&store, wk.array_list, wk.collection));
    assert!(is_assignable(&store, wk.hash_set, wk.collection));
    assert!(is_assignable(&store, wk.hash_map, wk.map));
    assert!(!is_assignable(&store, wk.hash_map, wk.collection));
    assert!(!is_assignable(&store, wk.list, wk.array_list));
}

#[test]
fn assignability_walks_transitive_superclasses() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = store.well_known().object;

    let base = store.add_class(ClassDef::new(
        "com.example.Base",
        Some(Type::class(object, vec![])),
    ));
    let mid = store.add_class(ClassDef::new(
        "com.example.Mid",
        Some(Type::class(base, vec![])),
    ));
    let leaf = store.add_class(ClassDef::new(
        "com.example.Leaf",
        Some(Type::class(mid, vec![])),
    ));

    assert!(is_assignable(&store, leaf, base));
    assert!(is_assignable(&store, leaf, object));
    assert!(!is_assignable(&store, base, leaf));
}

#[test]
fn sealed_closure_skips_abstract_intermediates() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);

    // Leaves are registered first so the sealed root can reference them.
    let circle = store.add_class(ClassDef::new("com.example.Circle", Some(object_ty.clone())));
    let square = store.add_class(ClassDef::new("com.example.Square", Some(object_ty.clone())));
    let oblong = store.add_class(ClassDef::new("com.example.Oblong", Some(object_ty.clone())));

    let quad = store.add_class({
        let mut def = ClassDef::new("com.example.Quadrilateral", Some(object_ty.clone()));
        def.is_abstract = true;
        def.permitted_subtypes = vec![square, oblong];
        def
    });
    let shape = store.add_class({
        let mut def = ClassDef::new("com.example.Shape", Some(object_ty));
        def.is_abstract = true;
        def.permitted_subtypes = vec![circle, quad];
        def
    });

    let impls = concrete_implementations(&store, shape);
    assert_eq!(impls, vec![circle, square, oblong]);
}

#[test]
fn erase_fails_on_unresolved_type_variable() {
    let mut store = TypeStore::with_minimal_jdk();
    let t = store.add_type_param("T", vec![]);
    assert_eq!(erase(&store, &Type::TypeVar(t)), None);
    assert_eq!(erase(&store, &Type::array(Type::TypeVar(t))), None);
}

#[test]
fn class_def_preserves_field_declaration_order() {
    let mut store = TypeStore::with_minimal_jdk();
    let string_ty = Type::class(store.well_known().string, vec![]);
    let object_ty = Type::class(store.well_known().object, vec![]);

    let person = store.add_class({
        let mut def = ClassDef::new("com.example.Person", Some(object_ty));
        def.fields = vec![
            FieldDef::new("name", string_ty.clone()),
            FieldDef::new("address", string_ty),
        ];
        def
    });

    let names: Vec<&str> = store
        .class(person)
        .unwrap()
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["name", "address"]);
    assert_eq!(store.class(person).unwrap().kind, ClassKind::Class);
}
