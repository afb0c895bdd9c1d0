use thiserror::Error;

use crate::dom::NodeId;

/// All errors that can occur in uclases-core and the widgets built on it.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Missing required attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Missing required element: {0}")]
    MissingElement(&'static str),

    #[error("Container already initialized: {0}")]
    AlreadyInitialized(NodeId),

    #[error("Cannot append {child} inside its own subtree under {parent}")]
    TreeCycle { parent: NodeId, child: NodeId },

    #[error("Cannot remove the document root")]
    RootRemoval,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, WidgetError>;
