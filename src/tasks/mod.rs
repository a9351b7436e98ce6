//! Background Tasks Module
//!
//! # Tasks
//! - TTL Cleanup: purges expired keys from the in-memory store

mod cleanup;

pub use cleanup::spawn_cleanup_task;
