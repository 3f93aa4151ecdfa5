//! Directory module: the organizational container tree and its hierarchy
//! configuration.
//!
//! Containers form one polymorphic tree (a single table tagged by level)
//! with materialized-path ancestry. The module keeps the external
//! relationship engine's graph synchronized with every container and
//! membership mutation.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;

pub use config::{HierarchyConfig, HierarchyError, LevelConfig};
pub use domain::model::{Container, Membership, NewContainer};
pub use domain::service::DirectoryService;
