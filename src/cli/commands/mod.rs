//! CLI command implementations

pub mod cap;
pub mod group;
pub mod revise;
pub mod summary;
