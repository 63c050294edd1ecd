use std::fmt;
use thiserror::Error;

/// The kinds of entity an operator can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Channel,
    Subchannel,
    Server,
    Socket,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Channel => "channel",
            EntityKind::Subchannel => "subchannel",
            EntityKind::Server => "server",
            EntityKind::Socket => "socket",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Cannot find {kind} with ID or target equal to {token}")]
    NotFound { kind: EntityKind, token: String },

    #[error("More than one {kind} is connecting to target {token}; use a numeric ID instead")]
    Ambiguous { kind: EntityKind, token: String },

    #[error("{kind} {id} referenced by {parent} no longer exists")]
    StaleReference {
        kind: EntityKind,
        id: i64,
        parent: String,
    },

    #[error("Unsupported {0}")]
    UnsupportedVariant(String),

    #[error("RPC failed: {0}")]
    Transport(#[from] tonic::Status),

    #[error("Failed to connect: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScopeError {
    pub fn not_found(kind: EntityKind, token: impl Into<String>) -> Self {
        ScopeError::NotFound {
            kind,
            token: token.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;
