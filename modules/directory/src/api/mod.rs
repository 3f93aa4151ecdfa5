//! Transport surfaces for the directory module.

pub mod rest;
