//! Error types shared across the damaged-dispatch pipeline.

use thiserror::Error;

/// Every way a damaged-dispatch run can fail.
///
/// All variants are fatal to a run; the binary prints the error and exits.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// File access failures (missing inputs, unwritable outputs).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network JSON could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Damaged-profile CSV could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or inconsistent run configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A component with the same name already exists.
    #[error("{kind} \"{name}\" already exists in the network")]
    DuplicateComponent { kind: &'static str, name: String },

    /// A component references something the network does not contain.
    #[error("{kind} \"{name}\" not found in the network")]
    UnknownComponent { kind: &'static str, name: String },

    /// The network data itself is inconsistent.
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// The damaged profile cannot be reconciled with or applied to the network.
    #[error("profile error: {0}")]
    Profile(String),

    /// The optimizer failed (infeasible, unbounded or numerical trouble).
    #[error("solver error: {0}")]
    Solver(String),
}

/// Convenience alias used throughout the crate.
pub type DispatchResult<T> = Result<T, DispatchError>;
