//! Directory domain: models, errors and the container service.

pub mod error;
pub mod model;
pub mod service;

pub use error::DomainError;
