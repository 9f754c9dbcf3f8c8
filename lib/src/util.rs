use crate::convert::{dataset_to_string, SerializeOptions};
use crate::parse::{json_ld_format, parse_quads};
use anyhow::{anyhow, Result};

use std::path::Path;

use reqwest::header::ACCEPT;

use oxigraph::io::RdfFormat;
use oxigraph::model::{Dataset, Quad};

use log::{debug, info};

const ACCEPT_RDF: &str = "text/turtle, application/n-triples, application/ld+json;q=0.9, application/rdf+xml;q=0.8";

/// Guesses an RDF format from a file extension.
pub fn format_from_path(path: &Path) -> Option<RdfFormat> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    match ext {
        "ttl" | "n3" => Some(RdfFormat::Turtle),
        "nt" => Some(RdfFormat::NTriples),
        "nq" => Some(RdfFormat::NQuads),
        "trig" => Some(RdfFormat::TriG),
        "xml" | "rdf" | "owl" => Some(RdfFormat::RdfXml),
        "jsonld" | "json" => Some(json_ld_format()),
        _ => None,
    }
}

/// Maps an HTTP content type (parameters ignored) to an RDF format.
pub fn format_from_content_type(content_type: &str) -> Option<RdfFormat> {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    match media_type {
        "application/x-turtle" | "text/rdf+n3" => Some(RdfFormat::Turtle),
        other => RdfFormat::from_media_type(other),
    }
}

/// Reads a file, choosing the parser from its extension (Turtle by default).
pub fn read_file(file: &Path, base_iri: Option<&str>) -> Result<Vec<Quad>> {
    debug!("Reading file: {}", file.display());
    let content = std::fs::read_to_string(file)?;
    let format = format_from_path(file).unwrap_or(RdfFormat::Turtle);
    parse_quads(&content, format, base_iri)
}

/// Fetches RDF over HTTP. The response's content type picks the parser; when it
/// is missing or unknown, Turtle, RDF/XML and N-Triples are tried in order.
pub fn read_url(url: &str) -> Result<Vec<Quad>> {
    debug!("Reading url: {}", url);

    let client = reqwest::blocking::Client::new();
    let resp = client.get(url).header(ACCEPT, ACCEPT_RDF).send()?;
    if !resp.status().is_success() {
        return Err(anyhow!("Failed to fetch RDF from {}: {}", url, resp.status()));
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .and_then(|ct| {
            let format = format_from_content_type(ct);
            if format.is_none() {
                debug!("Unknown content type: {}", ct);
            }
            format
        });
    let content = resp.text()?;

    if let Some(format) = content_type {
        return parse_quads(&content, format, Some(url));
    }
    let mut last_error = None;
    for format in [RdfFormat::Turtle, RdfFormat::RdfXml, RdfFormat::NTriples] {
        match parse_quads(&content, format, Some(url)) {
            Ok(quads) => return Ok(quads),
            Err(e) => {
                debug!("Could not parse {} as {}: {}", url, format.name(), e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("Failed to parse RDF from {}", url)))
}

/// Reads RDF from a URL when `location` looks like one, else from a file.
pub fn read_location(location: &str, base_iri: Option<&str>) -> Result<Vec<Quad>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        read_url(location)
    } else {
        read_file(Path::new(location), base_iri)
    }
}

pub fn write_dataset_to_file(dataset: &Dataset, file: &Path, options: &SerializeOptions) -> Result<()> {
    info!(
        "Writing dataset to file: {} with length {}",
        file.display(),
        dataset.len()
    );
    std::fs::write(file, dataset_to_string(dataset, options)?)?;
    Ok(())
}
