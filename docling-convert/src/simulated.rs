//! Canned converter for environments without real extraction.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::ConvertError;
use crate::types::{ConversionMetadata, ConversionOutput, Converter};

/// Page count reported for every simulated conversion.
const SIMULATED_PAGE_COUNT: u32 = 5;

/// Sleeps for `delay`, then produces a fixed Markdown document.
///
/// The input file is not read.
#[derive(Debug, Clone)]
pub struct SimulatedConverter {
    delay: Duration,
    language: String,
}

impl SimulatedConverter {
    pub fn new(delay: Duration, language: impl Into<String>) -> Self {
        Self {
            delay,
            language: language.into(),
        }
    }
}

#[async_trait]
impl Converter for SimulatedConverter {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn convert(
        &self,
        document_id: &str,
        path: &Path,
    ) -> Result<ConversionOutput, ConvertError> {
        debug!(
            document_id,
            path = %path.display(),
            delay_ms = self.delay.as_millis() as u64,
            "simulating conversion"
        );
        tokio::time::sleep(self.delay).await;

        let now = Utc::now();
        let markdown = format!(
            "# Document {document_id}\n\
             \n\
             ## Résumé\n\
             Ce document a été converti automatiquement depuis un fichier PDF.\n\
             \n\
             ## Contenu\n\
             Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n\
             \n\
             ### Section 1\n\
             Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris.\n\
             \n\
             ### Section 2\n\
             Duis aute irure dolor in reprehenderit in voluptate velit esse.\n\
             \n\
             ## Métadonnées extraites\n\
             - **Nombre de pages**: {SIMULATED_PAGE_COUNT}\n\
             - **Langue**: {language}\n\
             \n\
             ---\n\
             *Converti le {stamp}*\n",
            language = self.language,
            stamp = now.format("%d/%m/%Y à %H:%M"),
        );

        Ok(ConversionOutput {
            markdown,
            metadata: ConversionMetadata {
                page_count: SIMULATED_PAGE_COUNT,
                language: self.language.clone(),
                extracted_at: now,
            },
        })
    }
}
