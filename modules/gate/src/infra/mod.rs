//! Infrastructure: sea-orm storage for programmatic keys.

pub mod storage;
