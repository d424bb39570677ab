//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Remote purge: drops expired entries from the in-process remote store

mod purge;

pub use purge::spawn_remote_purge_task;
