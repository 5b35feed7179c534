//! Nominal type model used by the population-plan builder.
//!
//! Instead of leaning on any runtime reflection API, consumers register
//! class metadata ([`ClassDef`]) in a [`TypeStore`] and describe values with
//! the closed [`Type`] algebra. The node-graph engine resolves generics,
//! subtyping, and erasure purely against this model.

use std::fmt;

use serde::{Deserialize, Serialize};

mod display;
mod store;

pub use display::TypeDisplay;
pub use store::{TypeStore, WellKnownTypes};

/// Identifies a [`ClassDef`] registered in a [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a formal type parameter ([`TypeParamDef`]) in a [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(pub(crate) u32);

impl TypeVarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque scalar leaf types. These cannot be subtyped and never have members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A class instantiation: the defining class plus actual type arguments.
///
/// Empty `args` on a generic class means a raw instantiation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

/// Bound of a wildcard type argument.
///
/// Only a single upper bound is modeled. `Super` carries the lower bound for
/// display purposes; resolution always goes through the upper bound, which
/// for `Super` and `Unbounded` is the root object class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// The closed type-descriptor algebra.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A concrete class (empty args) or parameterized instantiation.
    Class(ClassType),
    /// A formal type parameter occurrence.
    TypeVar(TypeVarId),
    /// A wildcard type argument.
    Wildcard(WildcardBound),
    /// An array with a (possibly generic) component type.
    Array(Box<Type>),
    /// A scalar leaf.
    Primitive(PrimitiveType),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    /// The defining class when this is a class type.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class(ct) => Some(ct.def),
            _ => None,
        }
    }

    pub fn is_type_var(&self) -> bool {
        matches!(self, Type::TypeVar(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }
}

/// Nominal classification of a registered class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Record,
    Enum,
}

/// Method visibility, used for setter filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

/// An instance or static field declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub is_final: bool,
}

impl FieldDef {
    /// Convenience constructor for the common non-static, non-final case.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_final: false,
        }
    }
}

/// A single-parameter method that may act as a setter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub param: Type,
    pub is_static: bool,
    pub visibility: Visibility,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, param: Type) -> Self {
        Self {
            name: name.into(),
            param,
            is_static: false,
            visibility: Visibility::Public,
        }
    }
}

/// A formal type parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
}

/// Class metadata registered in a [`TypeStore`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Qualified name, e.g. `com.example.Person`.
    pub name: String,
    pub kind: ClassKind,
    pub is_abstract: bool,
    /// Non-empty means the class is sealed to exactly these subtypes.
    pub permitted_subtypes: Vec<ClassId>,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    /// Declaration order is preserved; it drives child-node ordering.
    pub fields: Vec<FieldDef>,
    pub setters: Vec<MethodDef>,
}

impl ClassDef {
    /// A plain concrete class extending the given supertype.
    pub fn new(name: impl Into<String>, super_class: Option<Type>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            is_abstract: false,
            permitted_subtypes: Vec::new(),
            type_params: Vec::new(),
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            setters: Vec::new(),
        }
    }

    pub fn is_sealed(&self) -> bool {
        !self.permitted_subtypes.is_empty()
    }

    /// Package prefix of the qualified name, including the trailing dot,
    /// or an empty string for unqualified names.
    pub fn package_prefix(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..=idx],
            None => "",
        }
    }

    /// Simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }
}

/// Erase a descriptor to its raw shape: a raw class, a primitive, or an
/// array of an erased component.
///
/// Type variables do not erase; they must be resolved before a node can be
/// built for them, so `None` here signals an unresolved slot. Wildcards
/// erase through their upper bound.
pub fn erase(store: &TypeStore, ty: &Type) -> Option<Type> {
    match ty {
        Type::Class(ct) => Some(Type::class(ct.def, vec![])),
        Type::Primitive(p) => Some(Type::Primitive(*p)),
        Type::Array(component) => erase(store, component).map(Type::array),
        Type::Wildcard(bound) => erase(store, &upper_bound(store, bound)),
        Type::TypeVar(_) => None,
    }
}

/// The effective upper bound of a wildcard. `Super` and `Unbounded`
/// wildcards are bounded above by the root object class.
pub fn upper_bound(store: &TypeStore, bound: &WildcardBound) -> Type {
    match bound {
        WildcardBound::Extends(ty) => (**ty).clone(),
        WildcardBound::Unbounded | WildcardBound::Super(_) => {
            Type::class(store.well_known().object, vec![])
        }
    }
}

/// Whether `sub` is the same class as, or a transitive subtype of, `sup`.
///
/// Walks the erased superclass/interface graph breadth-first.
pub fn is_assignable(store: &TypeStore, sub: ClassId, sup: ClassId) -> bool {
    use std::collections::{HashSet, VecDeque};

    if sub == sup {
        return true;
    }

    let mut queue: VecDeque<ClassId> = VecDeque::new();
    let mut seen: HashSet<ClassId> = HashSet::new();
    queue.push_back(sub);

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if current == sup {
            return true;
        }
        let Some(def) = store.class(current) else {
            continue;
        };
        if let Some(id) = def.super_class.as_ref().and_then(Type::class_id) {
            queue.push_back(id);
        }
        for iface in &def.interfaces {
            if let Some(id) = iface.class_id() {
                queue.push_back(id);
            }
        }
    }
    false
}

/// Concrete implementations of a sealed class, transitively.
///
/// A permitted subtype that is itself sealed or abstract contributes its own
/// permitted subtypes instead of itself. The result is deduplicated and
/// sorted by registration order so selection under a fixed seed is stable.
pub fn concrete_implementations(store: &TypeStore, sealed: ClassId) -> Vec<ClassId> {
    use std::collections::HashSet;

    let mut out = Vec::new();
    let mut seen: HashSet<ClassId> = HashSet::new();
    let mut stack = vec![sealed];

    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        let Some(def) = store.class(current) else {
            continue;
        };
        if current != sealed && !def.is_abstract && def.kind != ClassKind::Interface {
            out.push(current);
        }
        stack.extend(def.permitted_subtypes.iter().copied());
    }

    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_and_simple_name_split() {
        let def = ClassDef::new("com.example.Person", None);
        assert_eq!(def.package_prefix(), "com.example.");
        assert_eq!(def.simple_name(), "Person");

        let unqualified = ClassDef::new("Person", None);
        assert_eq!(unqualified.package_prefix(), "");
        assert_eq!(unqualified.simple_name(), "Person");
    }

    #[test]
    fn erase_unwraps_arrays_and_wildcards() {
        let store = TypeStore::with_minimal_jdk();
        let string = store.well_known().string;
        let object = store.well_known().object;

        let string_ty = Type::class(string, vec![]);
        let arr = Type::array(string_ty.clone());
        assert_eq!(erase(&store, &arr), Some(Type::array(string_ty.clone())));

        let extends = Type::Wildcard(WildcardBound::Extends(Box::new(string_ty.clone())));
        assert_eq!(erase(&store, &extends), Some(string_ty));

        let unbounded = Type::Wildcard(WildcardBound::Unbounded);
        assert_eq!(erase(&store, &unbounded), Some(Type::class(object, vec![])));
    }
}
