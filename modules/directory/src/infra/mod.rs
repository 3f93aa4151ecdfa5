//! Infrastructure: sea-orm storage for the container tree.

pub mod storage;
