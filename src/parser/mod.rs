//! Text-level parsing shared by both engines: header blocks, dates, body
//! normalization, and the EML engine.

pub mod body;
pub mod eml;
pub mod header;
