use pretty_assertions::assert_eq;
use specimen_config::{AssignmentType, MethodModifier, OnSetterUnmatched, Settings, SetterStyle};
use specimen_nodes::{NodeContext, NodeFactory, NodeTree};
use specimen_types::{
    ClassDef, ClassKind, FieldDef, MethodDef, PrimitiveType, Type, TypeStore, Visibility,
};

fn method_settings() -> Settings {
    Settings {
        assignment: AssignmentType::Method,
        on_setter_unmatched: OnSetterUnmatched::Invoke,
        ..Settings::default()
    }
}

fn build(store: &TypeStore, root: &Type, settings: Settings) -> NodeTree {
    let ctx = NodeContext::builder(store, root.clone())
        .settings(settings.compile().unwrap())
        .build();
    NodeFactory::new(&ctx).create_root_node(root).unwrap()
}

fn person_fixture() -> (TypeStore, Type) {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let person = store.add_class({
        let mut def = ClassDef::new("com.example.Person", Some(object_ty));
        def.fields = vec![
            FieldDef::new("name", string_ty.clone()),
            FieldDef::new("age", Type::Primitive(PrimitiveType::Int)),
        ];
        def.setters = vec![
            MethodDef::new("setName", string_ty.clone()),
            MethodDef::new("setAge", Type::Primitive(PrimitiveType::Int)),
            MethodDef::new("setNickname", string_ty),
        ];
        def
    });
    (store, Type::class(person, vec![]))
}

#[test]
fn fields_pair_with_setters_and_unmatched_setters_become_children() {
    let (store, root_ty) = person_fixture();
    let tree = build(&store, &root_ty, method_settings());

    let root = tree.node(tree.root());
    assert_eq!(root.children().len(), 3);

    let name = tree.node(root.children()[0]);
    assert_eq!(name.field().unwrap().name, "name");
    assert_eq!(name.setter().unwrap().name, "setName");

    let age = tree.node(root.children()[1]);
    assert_eq!(age.field().unwrap().name, "age");
    assert_eq!(age.setter().unwrap().name, "setAge");

    // The leftover setter matched no field: node with a setter only.
    let nickname = tree.node(root.children()[2]);
    assert!(nickname.field().is_none());
    assert_eq!(nickname.setter().unwrap().name, "setNickname");
}

#[test]
fn every_field_and_setter_is_accounted_for_exactly_once() {
    let (store, root_ty) = person_fixture();
    let tree = build(&store, &root_ty, method_settings());

    let root = tree.node(tree.root());
    let mut field_names = Vec::new();
    let mut setter_names = Vec::new();
    for &id in root.children() {
        let node = tree.node(id);
        if let Some(field) = node.field() {
            field_names.push(field.name.clone());
        }
        if let Some(setter) = node.setter() {
            setter_names.push(setter.name.clone());
        }
    }
    field_names.sort();
    setter_names.sort();
    assert_eq!(field_names, vec!["age", "name"]);
    assert_eq!(setter_names, vec!["setAge", "setName", "setNickname"]);
}

#[test]
fn unmatched_setters_are_dropped_under_the_ignore_policy() {
    let (store, root_ty) = person_fixture();
    let settings = Settings {
        on_setter_unmatched: OnSetterUnmatched::Ignore,
        ..method_settings()
    };
    let tree = build(&store, &root_ty, settings);
    assert_eq!(tree.node(tree.root()).children().len(), 2);
}

#[test]
fn field_only_assignment_never_pairs_setters() {
    let (store, root_ty) = person_fixture();
    let tree = build(&store, &root_ty, Settings::default());

    let root = tree.node(tree.root());
    assert_eq!(root.children().len(), 2);
    for &id in root.children() {
        assert!(tree.node(id).setter().is_none());
    }
}

#[test]
fn final_fields_are_not_paired_with_setters() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let doc = store.add_class({
        let mut def = ClassDef::new("com.example.Document", Some(object_ty));
        def.fields = vec![FieldDef {
            name: "title".to_string(),
            ty: string_ty.clone(),
            is_static: false,
            is_final: true,
        }];
        def.setters = vec![MethodDef::new("setTitle", string_ty)];
        def
    });

    let settings = Settings {
        on_setter_unmatched: OnSetterUnmatched::Ignore,
        ..method_settings()
    };
    let tree = build(&store, &Type::class(doc, vec![]), settings);

    let title = tree.node(tree.only_child(tree.root()));
    assert_eq!(title.field().unwrap().name, "title");
    assert!(title.setter().is_none());
}

#[test]
fn records_skip_setter_matching_entirely() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);

    let point = store.add_class({
        let mut def = ClassDef::new("com.example.Point", Some(object_ty));
        def.kind = ClassKind::Record;
        def.fields = vec![
            FieldDef::new("x", Type::Primitive(PrimitiveType::Int)),
            FieldDef::new("y", Type::Primitive(PrimitiveType::Int)),
        ];
        def.setters = vec![MethodDef::new("setX", Type::Primitive(PrimitiveType::Int))];
        def
    });

    let tree = build(&store, &Type::class(point, vec![]), method_settings());
    let root = tree.node(tree.root());
    assert_eq!(root.kind(), specimen_nodes::NodeKind::Record);
    assert_eq!(root.children().len(), 2);
    for &id in root.children() {
        assert!(tree.node(id).setter().is_none());
    }
}

#[test]
fn static_fields_are_skipped_and_inheritance_is_subclass_first() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let base = store.add_class({
        let mut def = ClassDef::new("com.example.Base", Some(object_ty));
        def.fields = vec![
            FieldDef::new("inherited", string_ty.clone()),
            FieldDef {
                name: "CONSTANT".to_string(),
                ty: string_ty.clone(),
                is_static: true,
                is_final: true,
            },
        ];
        def
    });
    let derived = store.add_class({
        let mut def = ClassDef::new("com.example.Derived", Some(Type::class(base, vec![])));
        def.fields = vec![FieldDef::new("own", string_ty)];
        def
    });

    let tree = build(&store, &Type::class(derived, vec![]), Settings::default());
    let names: Vec<String> = tree
        .node(tree.root())
        .children()
        .iter()
        .map(|&id| tree.node(id).field().unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["own", "inherited"]);
}

#[test]
fn excluded_package_stops_the_inheritance_walk() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let vendor_base = store.add_class({
        let mut def = ClassDef::new("vendor.lib.Widget", Some(object_ty));
        def.fields = vec![FieldDef::new("vendorState", string_ty.clone())];
        def
    });
    let derived = store.add_class({
        let mut def = ClassDef::new("com.example.Button", Some(Type::class(vendor_base, vec![])));
        def.fields = vec![FieldDef::new("label", string_ty)];
        def
    });

    let settings = Settings {
        excluded_packages: vec!["java.".to_string(), "vendor.".to_string()],
        ..Settings::default()
    };
    let tree = build(&store, &Type::class(derived, vec![]), settings);
    let names: Vec<String> = tree
        .node(tree.root())
        .children()
        .iter()
        .map(|&id| tree.node(id).field().unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["label"]);
}

#[test]
fn excluded_modifiers_filter_setters() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let widget = store.add_class({
        let mut def = ClassDef::new("com.example.Widget", Some(object_ty));
        def.fields = vec![FieldDef::new("label", string_ty.clone())];
        def.setters = vec![
            MethodDef {
                name: "setLabel".to_string(),
                param: string_ty.clone(),
                is_static: false,
                visibility: Visibility::Private,
            },
            MethodDef {
                name: "setCache".to_string(),
                param: string_ty,
                is_static: true,
                visibility: Visibility::Public,
            },
        ];
        def
    });

    let settings = Settings {
        setter_exclude_modifiers: vec![MethodModifier::Static, MethodModifier::Private],
        ..method_settings()
    };
    let tree = build(&store, &Type::class(widget, vec![]), settings);

    // The private setter is not matched and the static one is not
    // collected, so only the bare field remains.
    let root = tree.node(tree.root());
    assert_eq!(root.children().len(), 1);
    let label = tree.node(root.children()[0]);
    assert_eq!(label.field().unwrap().name, "label");
    assert!(label.setter().is_none());
}

#[test]
fn overridden_setters_deduplicate_against_the_subclass() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let base = store.add_class({
        let mut def = ClassDef::new("com.example.AbstractForm", Some(object_ty));
        def.setters = vec![MethodDef::new("setHint", string_ty.clone())];
        def
    });
    let form = store.add_class({
        let mut def = ClassDef::new("com.example.LoginForm", Some(Type::class(base, vec![])));
        def.fields = vec![FieldDef::new("user", string_ty.clone())];
        def.setters = vec![
            MethodDef::new("setHint", string_ty.clone()),
            MethodDef::new("setUser", string_ty),
        ];
        def
    });

    let tree = build(&store, &Type::class(form, vec![]), method_settings());
    let root = tree.node(tree.root());

    // user pairs with setUser; setHint appears exactly once even though
    // both classes declare the same signature.
    assert_eq!(root.children().len(), 2);
    let hint = tree.node(root.children()[1]);
    assert!(hint.field().is_none());
    assert_eq!(hint.setter().unwrap().name, "setHint");
    assert_eq!(hint.setter().unwrap().declaring, form);
}

#[test]
fn with_style_uses_the_with_prefix() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let builder = store.add_class({
        let mut def = ClassDef::new("com.example.RequestBuilder", Some(object_ty));
        def.fields = vec![FieldDef::new("url", string_ty.clone())];
        def.setters = vec![MethodDef::new("withUrl", string_ty)];
        def
    });

    let settings = Settings {
        setter_style: SetterStyle::With,
        on_setter_unmatched: OnSetterUnmatched::Ignore,
        ..method_settings()
    };
    let tree = build(&store, &Type::class(builder, vec![]), settings);

    let url = tree.node(tree.only_child(tree.root()));
    assert_eq!(url.setter().unwrap().name, "withUrl");
}

#[test]
fn property_style_matches_but_collects_no_unmatched_setters() {
    let mut store = TypeStore::with_minimal_jdk();
    let object_ty = Type::class(store.well_known().object, vec![]);
    let string_ty = Type::class(store.well_known().string, vec![]);

    let config = store.add_class({
        let mut def = ClassDef::new("com.example.Endpoint", Some(object_ty));
        def.fields = vec![FieldDef::new("host", string_ty.clone())];
        def.setters = vec![
            MethodDef::new("host", string_ty.clone()),
            // A single-argument method that is not a setter; without a
            // prefix it must not surface as an unmatched setter.
            MethodDef::new("connect", string_ty),
        ];
        def
    });

    let settings = Settings {
        setter_style: SetterStyle::Property,
        ..method_settings()
    };
    let tree = build(&store, &Type::class(config, vec![]), settings);

    let root = tree.node(tree.root());
    assert_eq!(root.children().len(), 1);
    assert_eq!(
        tree.node(root.children()[0]).setter().unwrap().name,
        "host"
    );
}
