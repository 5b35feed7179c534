use std::cell::{RefCell, RefMut};
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use specimen_config::CompiledSettings;
use specimen_types::{ClassId, Type, TypeStore};

use crate::node::{NodeId, NodeTree};

/// The type arguments bound by the root type descriptor.
///
/// For a parameterized root like `Pair<String, String>` this binds the
/// root class's formal parameters to the actual arguments; descendants
/// consult it first when resolving type variables.
#[derive(Clone, Debug)]
pub(crate) struct RootType {
    map: HashMap<Type, Type>,
}

impl RootType {
    pub(crate) fn new(store: &TypeStore, ty: Type) -> Self {
        let mut map = HashMap::new();
        if let Type::Class(ct) = &ty {
            if !ct.args.is_empty() {
                let formals = store
                    .class(ct.def)
                    .map(|def| def.type_params.as_slice())
                    .unwrap_or_default();
                for (formal, arg) in formals.iter().zip(ct.args.iter()) {
                    map.insert(Type::TypeVar(*formal), arg.clone());
                }
            }
        }
        Self { map }
    }

    pub(crate) fn mapping(&self, ty: &Type) -> Option<&Type> {
        self.map.get(ty)
    }
}

/// Seeded random source; the only shared mutable state the engine touches.
/// Used solely for picking an implementation of a sealed type.
#[derive(Clone, Debug)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..items.len());
        Some(&items[idx])
    }
}

/// Read-only view of a node (or a node under construction) handed to the
/// external callbacks.
#[derive(Clone, Copy, Debug)]
pub struct NodeQuery<'a> {
    pub target: &'a Type,
    pub declared: &'a Type,
    pub field_name: Option<&'a str>,
    pub setter_name: Option<&'a str>,
    pub depth: usize,
}

/// Per-selector subtype override supplied by the assignment-configuration
/// subsystem. Consulted first in the subtype resolution order.
///
/// The answer is an erased target type: a class type for class slots, or an
/// array type to substitute an array's component.
pub trait SubtypeSelector {
    fn subtype_for(&self, store: &TypeStore, query: &NodeQuery<'_>) -> Option<Type>;
}

/// Pluggable external type-resolution hook; an ordered list is consulted
/// and the first non-`None` answer wins. An answer that is not a subtype of
/// the class it was asked about is a configuration error and aborts
/// construction.
pub trait TypeResolutionProvider {
    fn resolve(&self, store: &TypeStore, class: ClassId) -> Option<ClassId>;
}

/// Per-node ignore decision from the selector subsystem. A matched node is
/// kept in the tree (for traceability) but downgraded to the ignored kind.
pub trait NodeIgnorePredicate {
    fn is_ignored(&self, store: &TypeStore, query: &NodeQuery<'_>) -> bool;
}

/// Opaque identity of an external origin selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OriginKey(pub String);

/// Reports which origin selectors match a node, so construction can reject
/// an origin that matches more than one node. Best-effort by design.
pub trait OriginSelectorRegistry {
    fn origin_keys(&self, store: &TypeStore, query: &NodeQuery<'_>) -> Vec<OriginKey>;
}

/// Post-expansion hook, invoked strictly after a node's children have been
/// attached. This is the coupling point for attaching feed-sourced value
/// generators, which inspect children by field name.
pub trait NodeListener {
    fn node_expanded(&self, store: &TypeStore, tree: &NodeTree, node: NodeId);
}

/// Everything the engine needs for one graph build: the type model, the
/// compiled settings, the root type arguments, the external callbacks, and
/// the random source.
pub struct NodeContext<'a> {
    store: &'a TypeStore,
    settings: CompiledSettings,
    root_type: RootType,
    subtype_selector: Option<Box<dyn SubtypeSelector + 'a>>,
    providers: Vec<Box<dyn TypeResolutionProvider + 'a>>,
    ignore_predicate: Option<Box<dyn NodeIgnorePredicate + 'a>>,
    origin_registry: Option<Box<dyn OriginSelectorRegistry + 'a>>,
    listeners: Vec<Box<dyn NodeListener + 'a>>,
    // Graph construction is single-threaded and synchronous; interior
    // mutability keeps the context shareable by reference during the build.
    random: RefCell<RandomSource>,
}

impl<'a> NodeContext<'a> {
    pub fn builder(store: &'a TypeStore, root: Type) -> NodeContextBuilder<'a> {
        NodeContextBuilder {
            store,
            settings: CompiledSettings::default(),
            root,
            subtype_selector: None,
            providers: Vec::new(),
            ignore_predicate: None,
            origin_registry: None,
            listeners: Vec::new(),
            seed: 0,
        }
    }

    pub fn store(&self) -> &'a TypeStore {
        self.store
    }

    pub fn settings(&self) -> &CompiledSettings {
        &self.settings
    }

    pub fn max_depth(&self) -> usize {
        self.settings.settings().max_depth
    }

    pub(crate) fn root_type(&self) -> &RootType {
        &self.root_type
    }

    pub(crate) fn random(&self) -> RefMut<'_, RandomSource> {
        self.random.borrow_mut()
    }

    pub(crate) fn selector_subtype(&self, query: &NodeQuery<'_>) -> Option<Type> {
        self.subtype_selector
            .as_ref()
            .and_then(|s| s.subtype_for(self.store, query))
    }

    /// Static name-to-name substitution from settings, resolved against the
    /// store. An entry naming an unknown class is skipped with a warning.
    pub(crate) fn static_subtype(&self, class: ClassId) -> Option<ClassId> {
        let name = self.store.class(class)?.name.as_str();
        let target_name = self.settings.settings().subtype_map.get(name)?;
        match self.store.class_id(target_name) {
            Some(id) => Some(id),
            None => {
                tracing::warn!(
                    "subtype mapping '{name}' -> '{target_name}' names an unregistered class"
                );
                None
            }
        }
    }

    pub(crate) fn providers(&self) -> &[Box<dyn TypeResolutionProvider + 'a>] {
        &self.providers
    }

    pub(crate) fn is_ignored(&self, query: &NodeQuery<'_>) -> bool {
        self.ignore_predicate
            .as_ref()
            .is_some_and(|p| p.is_ignored(self.store, query))
    }

    pub(crate) fn origin_registry(&self) -> Option<&(dyn OriginSelectorRegistry + 'a)> {
        self.origin_registry.as_deref()
    }

    pub(crate) fn listeners(&self) -> &[Box<dyn NodeListener + 'a>] {
        &self.listeners
    }
}

pub struct NodeContextBuilder<'a> {
    store: &'a TypeStore,
    settings: CompiledSettings,
    root: Type,
    subtype_selector: Option<Box<dyn SubtypeSelector + 'a>>,
    providers: Vec<Box<dyn TypeResolutionProvider + 'a>>,
    ignore_predicate: Option<Box<dyn NodeIgnorePredicate + 'a>>,
    origin_registry: Option<Box<dyn OriginSelectorRegistry + 'a>>,
    listeners: Vec<Box<dyn NodeListener + 'a>>,
    seed: u64,
}

impl<'a> NodeContextBuilder<'a> {
    pub fn settings(mut self, settings: CompiledSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn subtype_selector(mut self, selector: impl SubtypeSelector + 'a) -> Self {
        self.subtype_selector = Some(Box::new(selector));
        self
    }

    pub fn add_provider(mut self, provider: impl TypeResolutionProvider + 'a) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn ignore_predicate(mut self, predicate: impl NodeIgnorePredicate + 'a) -> Self {
        self.ignore_predicate = Some(Box::new(predicate));
        self
    }

    pub fn origin_registry(mut self, registry: impl OriginSelectorRegistry + 'a) -> Self {
        self.origin_registry = Some(Box::new(registry));
        self
    }

    pub fn add_listener(mut self, listener: impl NodeListener + 'a) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn build(self) -> NodeContext<'a> {
        NodeContext {
            store: self.store,
            settings: self.settings,
            root_type: RootType::new(self.store, self.root),
            subtype_selector: self.subtype_selector,
            providers: self.providers,
            ignore_predicate: self.ignore_predicate,
            origin_registry: self.origin_registry,
            listeners: self.listeners,
            random: RefCell::new(RandomSource::with_seed(self.seed)),
        }
    }
}
