//! Outlook `.msg` support: compound-file access, property lookup and the MSG engine.

pub mod attachment;
pub mod container;
pub mod engine;
#[cfg(test)]
pub(crate) mod fixture;
pub mod property;
pub mod stream;
