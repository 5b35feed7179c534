use std::fmt;

use crate::{Type, TypeStore, WildcardBound};

/// Renders a [`Type`] with simple (unqualified) class names, for logs and
/// error messages.
pub struct TypeDisplay<'a> {
    store: &'a TypeStore,
    ty: &'a Type,
}

impl<'a> TypeDisplay<'a> {
    pub fn new(store: &'a TypeStore, ty: &'a Type) -> Self {
        Self { store, ty }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_type(self.store, self.ty, f)
    }
}

fn fmt_type(store: &TypeStore, ty: &Type, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match ty {
        Type::Class(ct) => {
            let name = store
                .class(ct.def)
                .map_or("<unknown>", |def| def.simple_name());
            f.write_str(name)?;
            if !ct.args.is_empty() {
                f.write_str("<")?;
                for (i, arg) in ct.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_type(store, arg, f)?;
                }
                f.write_str(">")?;
            }
            Ok(())
        }
        Type::TypeVar(id) => {
            let name = store.type_param(*id).map_or("<var>", |tp| tp.name.as_str());
            f.write_str(name)
        }
        Type::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            f.write_str("? extends ")?;
            fmt_type(store, bound, f)
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            f.write_str("? super ")?;
            fmt_type(store, bound, f)
        }
        Type::Array(component) => {
            fmt_type(store, component, f)?;
            f.write_str("[]")
        }
        Type::Primitive(p) => f.write_str(p.name()),
    }
}
