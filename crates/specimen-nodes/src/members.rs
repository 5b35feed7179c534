use std::collections::HashSet;

use specimen_config::{AssignmentType, CompiledSettings, MethodModifier, OnSetterUnmatched};
use specimen_types::{erase, ClassId, MethodDef, Type, TypeDisplay, TypeStore, Visibility};

use crate::node::NodeKind;

/// A field slot, as collected from a class or one of its superclasses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub declaring: ClassId,
    pub name: String,
    pub ty: Type,
    pub is_final: bool,
}

/// A setter-like method collected for method-based assignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SetterRef {
    pub declaring: ClassId,
    pub name: String,
    pub param: Type,
}

/// A field paired with its best-matching setter, if any.
#[derive(Clone, Debug)]
pub struct MemberPair {
    pub field: FieldRef,
    pub setter: Option<SetterRef>,
}

/// All assignable slots of a struct-like class.
#[derive(Clone, Debug, Default)]
pub struct ClassData {
    pub member_pairs: Vec<MemberPair>,
    /// Collected setters that matched no field, in comparator order.
    /// Empty when the unmatched-setter policy is to ignore them.
    pub unmatched_setters: Vec<SetterRef>,
}

/// Collects fields and setters from a class and its superclass chain.
pub(crate) struct MemberCollector<'a> {
    store: &'a TypeStore,
    settings: &'a CompiledSettings,
}

impl<'a> MemberCollector<'a> {
    pub(crate) fn new(store: &'a TypeStore, settings: &'a CompiledSettings) -> Self {
        Self { store, settings }
    }

    pub(crate) fn class_data(&self, class: ClassId, kind: NodeKind) -> ClassData {
        let is_record = kind == NodeKind::Record;
        let method_assignment =
            self.settings.settings().assignment == AssignmentType::Method && !is_record;

        let fields = self.non_static_fields(class);
        let collected = if method_assignment {
            self.collect_setters(class)
        } else {
            Vec::new()
        };

        let mut matched: HashSet<SetterRef> = HashSet::new();
        let mut member_pairs = Vec::with_capacity(fields.len());

        for field in fields {
            // Record components and final fields cannot be reassigned, so
            // no setter is looked up for them.
            let setter = if method_assignment && !field.is_final {
                self.find_setter(class, &field)
            } else {
                None
            };
            if let Some(s) = &setter {
                matched.insert(s.clone());
            }
            member_pairs.push(MemberPair { field, setter });
        }

        let unmatched_setters =
            if self.settings.settings().on_setter_unmatched == OnSetterUnmatched::Ignore {
                Vec::new()
            } else {
                collected.into_iter().filter(|s| !matched.contains(s)).collect()
            };

        ClassData {
            member_pairs,
            unmatched_setters,
        }
    }

    /// Non-static fields of the class and its collectable superclasses, in
    /// per-class declaration order, the declaring class before its
    /// superclasses.
    ///
    /// Declaration order is preserved because it drives the order in which
    /// children are generated, which affects reproducibility for a seed.
    fn non_static_fields(&self, class: ClassId) -> Vec<FieldRef> {
        let mut collected = Vec::new();
        let mut next = Some(class);
        while let Some(id) = next.filter(|id| self.should_collect_from(*id)) {
            let def = self.store.class(id).expect("collectable class is registered");
            for field in &def.fields {
                if !field.is_static {
                    collected.push(FieldRef {
                        declaring: id,
                        name: field.name.clone(),
                        ty: field.ty.clone(),
                        is_final: field.is_final,
                    });
                }
            }
            next = def.super_class.as_ref().and_then(Type::class_id);
        }
        collected
    }

    fn should_collect_from(&self, class: ClassId) -> bool {
        if class == self.store.well_known().object {
            return false;
        }
        let Some(def) = self.store.class(class) else {
            return false;
        };
        def.kind != specimen_types::ClassKind::Interface
            && !self.settings.is_excluded_package(&def.name)
    }

    /// Candidate setters for unmatched-setter reporting.
    ///
    /// Only prefixed styles collect anything: without a prefix there is no
    /// way to tell a setter from any other single-argument method. The
    /// result is sorted with a stable comparator so it does not depend on
    /// registration order, and overridden signatures inherited from a
    /// superclass are dropped in favor of the subclass occurrence.
    fn collect_setters(&self, class: ClassId) -> Vec<SetterRef> {
        let Some(prefix) = self.settings.settings().setter_style.prefix() else {
            return Vec::new();
        };

        let mut collected: Vec<SetterRef> = Vec::new();
        let mut seen: HashSet<(String, Type)> = HashSet::new();

        let mut next = Some(class);
        while let Some(id) = next.filter(|id| self.should_collect_from(*id)) {
            let def = self.store.class(id).expect("collectable class is registered");
            for method in &def.setters {
                if self.is_excluded_by_modifiers(method) || !method.name.starts_with(prefix) {
                    continue;
                }
                let key = (
                    method.name.clone(),
                    erase(self.store, &method.param).unwrap_or_else(|| method.param.clone()),
                );
                if seen.insert(key) {
                    collected.push(SetterRef {
                        declaring: id,
                        name: method.name.clone(),
                        param: method.param.clone(),
                    });
                }
            }
            next = def.super_class.as_ref().and_then(Type::class_id);
        }

        collected.sort_by_cached_key(|s| {
            (
                s.name.clone(),
                TypeDisplay::new(self.store, &s.param).to_string(),
            )
        });
        collected
    }

    /// Find the setter matching a field under the configured naming
    /// convention. When several candidates share the derived name, one
    /// whose parameter erasure equals the field's is preferred.
    fn find_setter(&self, class: ClassId, field: &FieldRef) -> Option<SetterRef> {
        let expected = expected_setter_name(
            self.settings.settings().setter_style.prefix(),
            &field.name,
        );
        let field_erasure = erase(self.store, &field.ty);

        let mut fallback: Option<SetterRef> = None;
        let mut next = Some(class);
        while let Some(id) = next.filter(|id| self.should_collect_from(*id)) {
            let def = self.store.class(id).expect("collectable class is registered");
            for method in &def.setters {
                if self.is_excluded_by_modifiers(method) || method.name != expected {
                    continue;
                }
                let setter = SetterRef {
                    declaring: id,
                    name: method.name.clone(),
                    param: method.param.clone(),
                };
                if field_erasure.is_some() && erase(self.store, &method.param) == field_erasure {
                    return Some(setter);
                }
                fallback.get_or_insert(setter);
            }
            next = def.super_class.as_ref().and_then(Type::class_id);
        }
        fallback
    }

    fn is_excluded_by_modifiers(&self, method: &MethodDef) -> bool {
        self.settings
            .settings()
            .setter_exclude_modifiers
            .iter()
            .any(|modifier| match modifier {
                MethodModifier::Static => method.is_static,
                MethodModifier::Private => method.visibility == Visibility::Private,
                MethodModifier::PackagePrivate => {
                    method.visibility == Visibility::PackagePrivate
                }
                MethodModifier::Protected => method.visibility == Visibility::Protected,
            })
    }
}

/// Derive the setter name for a field under a naming convention:
/// `name` becomes `setName`/`withName`, or stays `name` for the
/// prefix-less property style.
fn expected_setter_name(prefix: Option<&str>, field_name: &str) -> String {
    match prefix {
        None => field_name.to_string(),
        Some(prefix) => {
            let mut out = String::with_capacity(prefix.len() + field_name.len());
            out.push_str(prefix);
            let mut chars = field_name.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
            out
        }
    }
}
