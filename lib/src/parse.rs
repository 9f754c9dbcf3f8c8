//! Ingestion of RDF input: serialized text, existing quad collections or
//! structured JSON-LD documents, normalized into one shared dataset.

use crate::store::{dataset_from_quads, SharedDataset};
use anyhow::Result;
use log::debug;
use oxigraph::io::{JsonLdProfileSet, RdfFormat, RdfParser};
use oxigraph::model::{Dataset, Quad};
use serde_json::Value;

/// The kinds of input a dataset can be built from.
#[derive(Debug, Clone)]
pub enum RdfInput {
    /// Serialized RDF text, parsed with the `ParseOptions` format
    Serialized(String),
    /// An owned dataset, wrapped without copying
    Dataset(Dataset),
    Quads(Vec<Quad>),
    /// An existing shared dataset; the result shares its content
    Shared(SharedDataset),
    /// A JSON-LD document, serialized to text and parsed as JSON-LD
    Document(Value),
}

impl From<&str> for RdfInput {
    fn from(value: &str) -> Self {
        RdfInput::Serialized(value.to_string())
    }
}

impl From<String> for RdfInput {
    fn from(value: String) -> Self {
        RdfInput::Serialized(value)
    }
}

impl From<Dataset> for RdfInput {
    fn from(value: Dataset) -> Self {
        RdfInput::Dataset(value)
    }
}

impl From<Vec<Quad>> for RdfInput {
    fn from(value: Vec<Quad>) -> Self {
        RdfInput::Quads(value)
    }
}

impl From<SharedDataset> for RdfInput {
    fn from(value: SharedDataset) -> Self {
        RdfInput::Shared(value)
    }
}

impl From<Value> for RdfInput {
    fn from(value: Value) -> Self {
        RdfInput::Document(value)
    }
}

/// Parser settings for serialized input. Without a format, Turtle is assumed,
/// which also reads N-Triples.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub format: Option<RdfFormat>,
    pub base_iri: Option<String>,
}

impl ParseOptions {
    pub fn with_format(mut self, format: RdfFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }
}

pub fn json_ld_format() -> RdfFormat {
    RdfFormat::JsonLd {
        profile: JsonLdProfileSet::default(),
    }
}

/// Parses serialized RDF text into quads with the given format and base IRI.
pub fn parse_quads(text: &str, format: RdfFormat, base_iri: Option<&str>) -> Result<Vec<Quad>> {
    let mut parser = RdfParser::from_format(format);
    if let Some(base_iri) = base_iri {
        parser = parser.with_base_iri(base_iri)?;
    }
    let quads = parser
        .for_reader(text.as_bytes())
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Parsed {} quads as {}", quads.len(), format.name());
    Ok(quads)
}

/// Normalizes any input into a shared dataset.
pub fn ingest(data: RdfInput, options: &ParseOptions) -> Result<SharedDataset> {
    let base_iri = options.base_iri.as_deref();
    match data {
        RdfInput::Serialized(text) => {
            let format = options.format.unwrap_or(RdfFormat::Turtle);
            Ok(SharedDataset::from_quads(parse_quads(&text, format, base_iri)?))
        }
        RdfInput::Dataset(dataset) => Ok(SharedDataset::from_dataset(dataset)),
        RdfInput::Quads(quads) => Ok(SharedDataset::from_dataset(dataset_from_quads(quads))),
        RdfInput::Shared(shared) => Ok(shared),
        RdfInput::Document(document) => {
            let text = serde_json::to_string(&document)?;
            Ok(SharedDataset::from_quads(parse_quads(
                &text,
                json_ld_format(),
                base_iri,
            )?))
        }
    }
}
