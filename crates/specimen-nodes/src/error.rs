use thiserror::Error;

/// Failures surfaced to the caller during graph construction.
///
/// Pruning and cycles are not errors and never appear here; every variant
/// indicates a configuration defect that would otherwise produce a silently
/// wrong population plan. Construction is a pure function of its inputs, so
/// none of these are retriable without changing the configuration.
#[derive(Debug, Error)]
pub enum NodeGraphError {
    /// A subtype mapping (selector, static table, or provider) produced a
    /// class that is not assignable to the nominal type it replaces.
    #[error("class '{subtype}' is not a subtype of '{nominal}'")]
    InvalidSubtype { nominal: String, subtype: String },

    /// An origin selector matched more than one node, so it is not clear
    /// which node's value a condition should be evaluated against.
    ///
    /// Evaluation stops after the second match; there could be more.
    #[error(
        "ambiguous origin '{origin}' matches multiple nodes\n\
         -> match 1: {first}\n\
         -> match 2: {second}\n\
         narrow the origin so that it matches only one target"
    )]
    AmbiguousOrigin {
        origin: String,
        first: String,
        second: String,
    },

    /// The root type itself could not be resolved to a node.
    #[error("unable to resolve the root type '{root}'")]
    UnresolvedRoot { root: String },
}
