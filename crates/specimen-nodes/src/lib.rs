//! Builds an object-population plan for a type registered in a
//! [`specimen_types::TypeStore`]: a tree of nodes describing every
//! reachable field, element, key, and value slot that must be assigned for
//! an instance of the type to be fully constructed.
//!
//! The engine discovers structure only; it never produces values. A
//! downstream generator walks the finished [`NodeTree`] in order, which is
//! why child ordering is deterministic for a given store, settings, and
//! seed.
//!
//! ```
//! use specimen_config::Settings;
//! use specimen_nodes::{NodeContext, NodeFactory};
//! use specimen_types::{ClassDef, FieldDef, Type, TypeStore};
//!
//! let mut store = TypeStore::with_minimal_jdk();
//! let string_ty = Type::class(store.well_known().string, vec![]);
//! let object_ty = Type::class(store.well_known().object, vec![]);
//! let person = store.add_class({
//!     let mut def = ClassDef::new("com.example.Person", Some(object_ty));
//!     def.fields = vec![FieldDef::new("name", string_ty)];
//!     def
//! });
//!
//! let root = Type::class(person, vec![]);
//! let ctx = NodeContext::builder(&store, root.clone())
//!     .settings(Settings::default().compile().unwrap())
//!     .build();
//! let tree = NodeFactory::new(&ctx).create_root_node(&root).unwrap();
//! assert_eq!(tree.node(tree.root()).children().len(), 1);
//! ```

mod context;
mod creator;
mod error;
mod factory;
mod kind;
mod members;
mod node;
mod type_helper;
mod type_map;

pub use context::{
    NodeContext, NodeContextBuilder, NodeIgnorePredicate, NodeListener, NodeQuery, OriginKey,
    OriginSelectorRegistry, RandomSource, SubtypeSelector, TypeResolutionProvider,
};
pub use error::NodeGraphError;
pub use factory::NodeFactory;
pub use members::{ClassData, FieldRef, MemberPair, SetterRef};
pub use node::{Node, NodeId, NodeKind, NodeStats, NodeTree};
pub use type_map::NodeTypeMap;
