use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Raised only under the `error` collision policy; aborts the run
    #[error("schema name collision for {name} between {existing} and {incoming}")]
    NameCollision {
        name: String,
        existing: String,
        incoming: String,
    },
}
