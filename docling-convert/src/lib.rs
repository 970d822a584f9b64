//! PDF to Markdown conversion.
//!
//! The job runner only knows the [`Converter`] trait. Two implementations are
//! provided:
//!
//! - [`PdfTextConverter`] extracts the text layer of the PDF page by page.
//! - [`SimulatedConverter`] waits for a fixed delay and returns a canned
//!   document, which is handy for wiring up the surrounding services.

mod error;
mod pdf;
mod simulated;
mod types;

pub use error::ConvertError;
pub use pdf::PdfTextConverter;
pub use simulated::SimulatedConverter;
pub use types::{ConversionMetadata, ConversionOutput, Converter};

// Re-export async_trait for convenience when implementing Converter
pub use async_trait::async_trait;
