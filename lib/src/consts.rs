//! Defines constant NamedNodeRefs for the RDF and XSD terms used when mapping
//! fields to quads, plus the JSON-LD keywords the context and converters understand.

use oxigraph::model::NamedNodeRef;

pub const TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");

// xsd
pub const XSD_STRING: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#string");
pub const XSD_BOOLEAN: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#boolean");
pub const XSD_INTEGER: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2001/XMLSchema#integer");

// json-ld keywords
pub const JSONLD_ID: &str = "@id";
pub const JSONLD_TYPE: &str = "@type";
pub const JSONLD_VALUE: &str = "@value";
pub const JSONLD_LANGUAGE: &str = "@language";
pub const JSONLD_CONTEXT: &str = "@context";
pub const JSONLD_CONTAINER: &str = "@container";
pub const JSONLD_VOCAB: &str = "@vocab";
pub const JSONLD_SET: &str = "@set";
pub const JSONLD_LIST: &str = "@list";
