//! Export functionality: attachment bytes to disk.

pub mod attachment;
