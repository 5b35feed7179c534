use specimen_types::{is_assignable, ClassId, ClassKind, TypeStore};

use crate::node::NodeKind;

/// Classify a class into a node kind.
///
/// Checks run in order, first match wins: collection, map, optional-like
/// container, record, then the default. Arrays and primitives never reach
/// this point; their kind is fixed by the type shape during node creation.
pub(crate) fn resolve_node_kind(store: &TypeStore, class: ClassId) -> NodeKind {
    let wk = store.well_known();

    if is_assignable(store, class, wk.collection) {
        return NodeKind::Collection;
    }
    if is_assignable(store, class, wk.map) {
        return NodeKind::Map;
    }
    if class == wk.optional {
        return NodeKind::Container;
    }
    match store.class(class).map(|def| def.kind) {
        Some(ClassKind::Record) => NodeKind::Record,
        _ => NodeKind::Default,
    }
}
