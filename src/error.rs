//! Caller-facing rejections.
//!
//! Stores never raise these: they report storage faults through
//! `anyhow::Error`. The [`manager`](crate::manager) layer validates input and
//! runs the duplicate-key pre-check before touching a store, and surfaces
//! problems with [`SnippetError`] so the CLI can print them as plain messages.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnippetError {
    #[error("snippet key must not be empty")]
    EmptyKey,

    #[error("snippet value must not be empty")]
    EmptyValue,

    #[error("a snippet with key '{0}' already exists")]
    DuplicateKey(String),

    #[error("snippet not found: {0}")]
    NotFound(String),

    #[error("unknown storage backend: '{0}'. Must be sqlite or json.")]
    UnknownBackend(String),
}
