//! Ingestion pipeline.
//!
//! One call takes pasted text through classification, parsing,
//! standardization and abbreviation. The core stages never fail; the only
//! errors here are caller policy (empty input, confidence too low).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::abbrev::{build_abbreviation_index, AbbreviationConfig, AbbreviationIndex};
use crate::classify::{classify_lines, Classification};
use crate::models::{ArmyList, EntityId, FormatId};
use crate::parsers::parser_for;
use crate::standardize::standardize_summary;
use crate::text::split_lines;

/// Errors returned by [`ingest_text`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No list text provided")]
    EmptyInput,

    #[error("Could not detect list format: best guess '{best}' at {confidence:.2}, below {threshold:.2}")]
    UndetectedFormat {
        best: FormatId,
        confidence: f64,
        threshold: f64,
    },
}

/// Caller policy for one ingest call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    /// Refuse to parse below this classifier confidence
    pub min_confidence: f64,
    /// Skip detection and parse as this dialect
    #[serde(default)]
    pub format_override: Option<FormatId>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            format_override: None,
        }
    }
}

/// Everything produced for one pasted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    /// Fingerprint of the input text
    pub id: EntityId,
    pub classification: Classification,
    /// Dialect actually used for parsing
    pub format: FormatId,
    pub list: ArmyList,
    pub abbreviations: AbbreviationIndex,
}

/// Run the full pipeline on raw text.
pub fn ingest_text(
    text: &str,
    options: &IngestOptions,
    abbreviations: &AbbreviationConfig,
) -> Result<IngestResult, IngestError> {
    let lines = split_lines(text);
    if lines.iter().all(|l| l.trim().is_empty()) {
        return Err(IngestError::EmptyInput);
    }

    let id = EntityId::for_list_text(&lines);
    let classification = classify_lines(&lines);
    info!(
        "Classified list {} as {} (confidence {:.2})",
        id, classification.format, classification.confidence
    );

    let format = match options.format_override {
        Some(format) => {
            if format != classification.format {
                warn!(
                    "Format override {} differs from detected {}",
                    format, classification.format
                );
            }
            format
        }
        None if classification.confidence < options.min_confidence => {
            return Err(IngestError::UndetectedFormat {
                best: classification.format,
                confidence: classification.confidence,
                threshold: options.min_confidence,
            });
        }
        None => classification.format,
    };

    let mut list = parser_for(format).parse(&lines);
    standardize_summary(&mut list, text);
    let abbreviations = build_abbreviation_index(&list, abbreviations);

    info!(
        "Parsed list {}: {} units, {} pts, {} abbreviations",
        id,
        list.units().count(),
        list.total_points(),
        abbreviations.flat_abbreviations.len()
    );

    Ok(IngestResult {
        id,
        classification,
        format,
        list,
        abbreviations,
    })
}
