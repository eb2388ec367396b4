use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a mail provider.
#[derive(Debug, Error)]
pub enum MailError {
    /// Mailbox unreachable, authentication refused or session dropped.
    #[error("mailbox connection failed: {0}")]
    Connection(String),

    /// The listing operation did not succeed (folder select or search).
    #[error("message listing failed: {0}")]
    Listing(String),

    /// A single message could not be fetched or decoded.
    #[error("message {position} unusable: {reason}")]
    Message { position: u32, reason: String },
}

/// Failures of the external catalog lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(String),

    #[error("lookup returned status {0}")]
    Status(u16),

    #[error("lookup response could not be decoded: {0}")]
    Decode(String),
}

/// Failures while reading or writing state and output documents.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored state exists but does not parse. It is left untouched.
    #[error("{path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
