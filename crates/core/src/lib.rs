//! Core types for mise-en-gitlab.
//!
//! This crate owns everything that is independent of the GitLab schema:
//!
//! - [`Value`] / [`Mapping`]: the ordered, loosely-typed value tree a task file
//!   is parsed into
//! - [`RawDocument`]: the parsed `mise.toml`, plus the loaders that produce it
//! - [`Error`]: the error taxonomy shared by the normalizer, emitter and CLI

pub mod document;
pub mod error;
pub mod value;

pub use document::{RawDocument, load_document, parse_document};
pub use error::{Error, ErrorKind, Result};
pub use value::{Mapping, Value};
