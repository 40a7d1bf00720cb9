//! Errors surfaced at the REPL boundary.

use thiserror::Error;

/// Top-level CLI error. `main` maps this to a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required environment variable was missing or malformed at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session store could not be opened or written to.
    #[error("session storage error: {0}")]
    Repo(#[from] layer0::RepoError),

    /// I/O failure reading from stdin or a state/vault directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
