//! Core data model: the normalized record, attachments and addresses.

pub mod address;
pub mod attachment;
pub mod message;
