pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod introspect;
pub mod render;

pub use error::{EntityKind, Result, ScopeError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
