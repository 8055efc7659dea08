use crate::graph::NodeType;

/// Errors raised while setting up an ION search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IonError {
    #[error("ION needs at least one input graph")]
    EmptyInput,

    #[error("variable `{name}` is {first:?} in one input graph and {second:?} in another")]
    ConflictingNodeType {
        name: String,
        first: NodeType,
        second: NodeType,
    },

    #[error("background knowledge mentions unknown variable `{name}`")]
    UnknownVariable { name: String },
}
