//! Security primitives shared by the gate and the directory module.
//!
//! Everything here is transient, per-request state: resolved identities,
//! requested capabilities and the decisions rendered for them. Nothing in
//! this crate is ever persisted.

pub mod capability;
pub mod decision;
pub mod identity;

pub use capability::Capability;
pub use decision::{DenyReason, PermissionDecision};
pub use identity::{Identity, IdentityKind};
