//! Durable storage for the conversion service.
//!
//! Two areas live on disk:
//!
//! - [`InputStore`] holds the uploaded PDFs, one file per submission named
//!   `{document_id}_{original_filename}`.
//! - [`ConversionStore`] holds the converted Markdown artifacts as
//!   `{document_id}.md`. The presence of an artifact is the only signal that a
//!   conversion completed.
//!
//! Both are traits so the local-disk implementations ([`FsInputStore`],
//! [`FsConversionStore`]) can be swapped for another backend without touching
//! the job runner.

mod artifact;
mod error;
mod input;
mod key;

pub use artifact::{ConversionStore, FsConversionStore, ARTIFACT_EXTENSION};
pub use error::StoreError;
pub use input::{FsInputStore, InputStore};
pub use key::{sanitize_filename, validate_document_id};

// Re-export async_trait for convenience when implementing the store traits
pub use async_trait::async_trait;
