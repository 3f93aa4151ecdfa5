use async_trait::async_trait;
use thiserror::Error;

use crate::tuple::RelationTuple;

/// Errors from the relationship engine.
///
/// Any engine failure is treated as a hard dependency failure by callers:
/// permission checks fail closed, tuple writes surface the error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be reached (connect, timeout, transport).
    #[error("relation engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered outside its contract.
    #[error("relation engine protocol error: {0}")]
    Protocol(String),
}

/// Point-check and tuple-synchronization interface to the engine.
///
/// The engine implements the inheritance rule itself
/// (`can_manage = admin OR admin-of-parent`, and so on); callers only
/// translate local ids into engine ids and issue point checks.
#[async_trait]
pub trait RelationEngine: Send + Sync {
    /// Does `subject` have `relation` on `object`?
    ///
    /// # Errors
    /// Returns `EngineError` when the engine is unreachable or answers
    /// outside its contract. Callers must treat errors as deny.
    async fn check(&self, subject: &str, relation: &str, object: &str)
        -> Result<bool, EngineError>;

    /// Write one relationship tuple.
    ///
    /// # Errors
    /// Returns `EngineError` on transport or contract failure. Writes are
    /// never retried by this crate.
    async fn write_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError>;

    /// Delete one relationship tuple.
    ///
    /// # Errors
    /// Returns `EngineError` on transport or contract failure. Deletes are
    /// never retried by this crate.
    async fn delete_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError>;
}
