use thiserror::Error as ThisError;

/// Error taxonomy of the enforcement engine.
///
/// Single-component toggles swallow these into a boolean `false` at the
/// repository boundary; bootstrap and explicit bind calls surface them.
/// The engine never retries on its own.
#[derive(Debug, ThisError)]
pub enum EngineError {
    /// Elevated privilege cannot be granted; fatal for PM-path work in
    /// this session.
    #[error("root privilege unavailable")]
    RootUnavailable,

    /// The privileged broker is not bound (yet, or anymore).
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// The declarative override store failed to read or write.
    #[error("override store error: {0}")]
    OverrideStore(String),

    /// Component enumeration failed in the OS oracle.
    #[error("component oracle error: {0}")]
    Oracle(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("actor error: {0}")]
    Actor(String),

    /// A spawned task panicked or was aborted.
    #[error("task error: {0}")]
    Task(String),
}

pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

impl IsTransient for EngineError {
    fn is_transient(&self) -> bool {
        // A dead broker can come back after a rebind; everything else is
        // either fatal for the session or must be surfaced to the caller.
        matches!(self, EngineError::BrokerUnavailable(_))
    }
}
