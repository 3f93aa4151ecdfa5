//! Storage layer for programmatic keys.

pub mod entity;
pub mod migrations;
pub mod repo;
