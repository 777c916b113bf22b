//! `mailnorm`: normalize Outlook `.msg` and RFC 5322 `.eml` files.
//!
//! Every input becomes one [`model::message::NormalizedMessage`] with the
//! same seven fields, whichever format it came from. MSG containers are
//! read through [`msg`], EML files through [`parser::eml`], and
//! [`engine`] picks between them by file extension.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod msg;
pub mod parser;
