//! Narrow seam to the external relationship-authorization engine.
//!
//! The engine owns the relationship graph and its expansion algorithm;
//! this crate only knows how to issue point checks and how to keep the
//! graph synchronized with tuple writes/deletes. Two implementations are
//! provided: an HTTP client for a real engine deployment and an in-memory
//! engine for development and tests.

pub mod engine;
pub mod http;
pub mod memory;
pub mod retry;
pub mod tuple;

pub use engine::{EngineError, RelationEngine};
pub use http::{HttpEngineConfig, HttpRelationEngine};
pub use memory::{InMemoryRelationEngine, UnavailableEngine};
pub use retry::{BackoffStrategy, CheckRetry};
pub use tuple::{object_container, subject_user, RelationTuple};
