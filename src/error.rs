use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the settings store, the document pipeline and the
/// flow-service client.
#[derive(Error, Debug)]
pub enum CliError {
    /// A path could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file or declarative document is not valid YAML (or does
    /// not match the expected shape).
    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A document's `kind` is neither `Peer` nor `Mirror`. Carries the
    /// literal value received.
    #[error("unsupported configuration kind: {0}")]
    UnsupportedKind(String),

    /// A peer document or flag set names a database kind the CLI does not
    /// know. Carries the literal value received.
    #[error("unsupported peer type: {0}")]
    UnsupportedPeerType(String),

    /// A required field is missing or invalid.
    #[error("{0}")]
    Validation(String),

    /// The flow service rejected a call or the transport failed.
    #[error("remote call failed: {0}")]
    Remote(String),

    /// A remote call or a whole apply batch exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The operator did not affirm a destructive operation.
    #[error("operation cancelled")]
    ConfirmationDeclined,
}
