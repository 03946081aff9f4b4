use thiserror::Error;

use crate::host::NodeId;
use crate::instance::InstanceId;

/// Every failure the engine reports. All of them are programmer misuse and
/// are propagated unchanged to the caller of the template call, the setter
/// or the event dispatch that triggered them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Misuse(#[from] MisuseError),
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// The literal skeleton of a call site cannot be compiled or called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("a U+FFFE character is invalid in template text (segment {segment})")]
    ReservedCharacter { segment: usize },
    #[error("attribute `{name}` mixes a dynamic value with literal text")]
    PartialAttribute { name: String },
    #[error("template expects {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },
    #[error("`{name}` is reserved for the engine's own markers")]
    ReservedName { name: String },
}

/// Two bindings disagree about a node, or an argument has the wrong shape
/// for the slot it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("key `{name}` overrides an existing property of the same name")]
    DuplicateProp { name: String },
    #[error("children prop should not be present if the node already contains data")]
    ChildrenConflict,
    #[error("dangerously-set-inner-html should not be present if the node already contains data")]
    InnerMarkupConflict,
    #[error("duplicate event handler `{name}`")]
    DuplicateHandler { name: String },
    #[error("duplicate attribute `{name}`")]
    DuplicateAttribute { name: String },
    #[error("argument {index} is bound to a component slot but is not a component")]
    ExpectedComponent { index: usize },
    #[error("argument {index} is spread but is not a map")]
    ExpectedMap { index: usize },
    #[error("dangerously-set-inner-html expects a map with an `__html` string")]
    ExpectedMarkup,
    #[error("slot reads argument {index}, which was not supplied")]
    MissingArgument { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MisuseError {
    #[error("component instance {instance} is already rendering")]
    Reentrant { instance: InstanceId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("node {id} missing")]
    Missing { id: NodeId },
    #[error("node {id} is not an element")]
    NotAnElement { id: NodeId },
    #[error("node {id} has no parent")]
    NoParent { id: NodeId },
    #[error("node {id} cannot be inserted into its own subtree")]
    Cycle { id: NodeId },
}
