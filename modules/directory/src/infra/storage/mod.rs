//! Storage layer: entities, migrations and query functions.

pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod repo;
