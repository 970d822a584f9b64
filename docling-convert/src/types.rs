use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Facts about the converted document, forwarded to the backend webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionMetadata {
    pub page_count: u32,
    pub language: String,
    pub extracted_at: DateTime<Utc>,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    pub markdown: String,
    pub metadata: ConversionMetadata,
}

/// Turns an input file into Markdown.
///
/// Implementations may take arbitrarily long; callers that need a bound wrap
/// the future in a timeout.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn convert(
        &self,
        document_id: &str,
        path: &Path,
    ) -> Result<ConversionOutput, ConvertError>;
}
