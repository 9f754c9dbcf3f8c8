//! Materializes quad collections as text (Turtle, N-Triples, N-Quads, TriG) through
//! oxigraph's serializers, or as a JSON-LD document shaped by a context.

use crate::consts::*;
use crate::context::{Container, Context, TermDefinition, TermType};
use anyhow::{anyhow, Result};
use log::debug;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{BlankNode, Dataset, Literal, NamedOrBlankNode, Quad, QuadRef, Term};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Text formats a quad collection can be written in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Turtle,
    NTriples,
    NQuads,
    TriG,
}

impl OutputFormat {
    pub fn rdf_format(self) -> RdfFormat {
        match self {
            OutputFormat::Turtle => RdfFormat::Turtle,
            OutputFormat::NTriples => RdfFormat::NTriples,
            OutputFormat::NQuads => RdfFormat::NQuads,
            OutputFormat::TriG => RdfFormat::TriG,
        }
    }

    /// Parses a format name as accepted on the command line.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(OutputFormat::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(OutputFormat::NTriples),
            "nquads" | "n-quads" | "nq" => Ok(OutputFormat::NQuads),
            "trig" => Ok(OutputFormat::TriG),
            other => Err(anyhow!(
                "Unsupported format '{}'. Use one of: turtle, ntriples, nquads, trig",
                other
            )),
        }
    }
}

/// Writer options: the output format plus an optional base IRI and prefixes.
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
    pub format: OutputFormat,
    pub base_iri: Option<String>,
    pub prefixes: Vec<(String, String)>,
}

impl SerializeOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, name: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.push((name.into(), iri.into()));
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }
}

/// Writes every quad through one serializer pass and returns the text.
///
/// Triple formats reject quads in named graphs; that error is returned as is.
pub fn quads_to_string<'a>(
    quads: impl IntoIterator<Item = QuadRef<'a>>,
    options: &SerializeOptions,
) -> Result<String> {
    let mut serializer = RdfSerializer::from_format(options.format.rdf_format());
    if let Some(base_iri) = &options.base_iri {
        serializer = serializer.with_base_iri(base_iri.as_str())?;
    }
    for (name, iri) in &options.prefixes {
        serializer = serializer.with_prefix(name.as_str(), iri.as_str())?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    let mut count = 0;
    for quad in quads {
        writer.serialize_quad(quad)?;
        count += 1;
    }
    let bytes = writer.finish()?;
    debug!("Serialized {} quads as {:?}", count, options.format);
    Ok(String::from_utf8(bytes)?)
}

pub fn dataset_to_string(dataset: &Dataset, options: &SerializeOptions) -> Result<String> {
    quads_to_string(dataset.iter(), options)
}

/// Renders quads as an array of JSON-LD node objects compacted with `context`.
///
/// Graph names are dropped: a quad in a named graph renders exactly like the same
/// triple in the default graph. Use N-Quads or TriG to keep graph membership.
pub fn quads_to_json_ld(quads: &[Quad], context: &Context) -> Value {
    let renderer = JsonLdRenderer::new(quads, context);
    Value::Array(renderer.render_all())
}

/// Renders the single node `subject` (with embedded blank nodes) as a JSON-LD object.
pub fn node_to_json_ld(quads: &[Quad], subject: &NamedOrBlankNode, context: &Context) -> Value {
    let renderer = JsonLdRenderer::new(quads, context);
    Value::Object(renderer.render_node(subject, true, &mut Walk::default()))
}

fn subject_key(subject: &NamedOrBlankNode) -> String {
    match subject {
        NamedOrBlankNode::NamedNode(n) => n.as_str().to_string(),
        NamedOrBlankNode::BlankNode(b) => format!("_:{}", b.as_str()),
    }
}

/// Keys of the nodes on the current nesting path, and of every blank node
/// embedded so far.
#[derive(Default)]
struct Walk {
    stack: HashSet<String>,
    embedded: HashSet<String>,
}

/// Groups quads by subject and predicate; blank nodes referenced exactly once are
/// nested inside their referrer.
struct JsonLdRenderer<'a> {
    context: &'a Context,
    subjects: BTreeMap<String, (NamedOrBlankNode, BTreeMap<String, Vec<&'a Term>>)>,
    blank_refs: HashMap<&'a BlankNode, usize>,
}

impl<'a> JsonLdRenderer<'a> {
    fn new(quads: &'a [Quad], context: &'a Context) -> Self {
        let mut subjects: BTreeMap<String, (NamedOrBlankNode, BTreeMap<String, Vec<&'a Term>>)> =
            BTreeMap::new();
        let mut blank_refs: HashMap<&'a BlankNode, usize> = HashMap::new();
        for quad in quads {
            let (_, predicates) = subjects
                .entry(subject_key(&quad.subject))
                .or_insert_with(|| (quad.subject.clone(), BTreeMap::new()));
            let objects = predicates
                .entry(quad.predicate.as_str().to_string())
                .or_default();
            // the same triple in several graphs collapses into one value
            if objects.contains(&&quad.object) {
                continue;
            }
            objects.push(&quad.object);
            if let Term::BlankNode(b) = &quad.object {
                *blank_refs.entry(b).or_default() += 1;
            }
        }
        Self {
            context,
            subjects,
            blank_refs,
        }
    }

    fn is_embeddable(&self, node: &BlankNode) -> bool {
        self.blank_refs.get(node).copied() == Some(1)
            && self.subjects.contains_key(&format!("_:{}", node.as_str()))
    }

    fn render_all(&self) -> Vec<Value> {
        let mut out = vec![];
        let mut rendered: HashSet<String> = HashSet::new();
        let mut walk = Walk::default();
        for (key, (subject, _)) in &self.subjects {
            if let NamedOrBlankNode::BlankNode(b) = subject {
                if self.is_embeddable(b) {
                    continue;
                }
            }
            out.push(Value::Object(self.render_node(subject, true, &mut walk)));
            rendered.insert(key.clone());
        }
        // blank nodes that only reference each other in a cycle have no top-level referrer;
        // the first one seen is the root and the rest of the cycle nests inside it
        for (key, (subject, _)) in &self.subjects {
            if rendered.contains(key)
                || walk.embedded.contains(key)
                || self.is_reachable_from_rendered(subject)
            {
                continue;
            }
            out.push(Value::Object(self.render_node(subject, true, &mut walk)));
            rendered.insert(key.clone());
        }
        out
    }

    fn is_reachable_from_rendered(&self, subject: &NamedOrBlankNode) -> bool {
        // an embeddable node is reachable when its single referrer chain ends at a
        // non-embeddable subject
        let mut current = subject.clone();
        let mut seen = HashSet::new();
        loop {
            let NamedOrBlankNode::BlankNode(b) = &current else {
                return true;
            };
            if !self.is_embeddable(b) {
                return true;
            }
            if !seen.insert(current.clone()) {
                return false;
            }
            let referrer = self.subjects.values().find_map(|(s, preds)| {
                preds
                    .values()
                    .any(|objs| objs.iter().any(|o| matches!(o, Term::BlankNode(x) if x == b)))
                    .then(|| s.clone())
            });
            match referrer {
                Some(r) => current = r,
                None => return true,
            }
        }
    }

    fn render_node(
        &self,
        subject: &NamedOrBlankNode,
        with_id: bool,
        walk: &mut Walk,
    ) -> Map<String, Value> {
        let key = subject_key(subject);
        let mut node = Map::new();
        if with_id || matches!(subject, NamedOrBlankNode::NamedNode(_)) {
            node.insert(self.context.id_key().to_string(), Value::String(key.clone()));
        }
        let Some((_, predicates)) = self.subjects.get(&key) else {
            return node;
        };
        walk.stack.insert(key.clone());
        for (predicate, objects) in predicates {
            let term = self
                .context
                .terms()
                .find(|t| t.iri.as_str() == predicate.as_str());
            let field = term.map_or(predicate.clone(), |t| t.name.clone());
            let values: Vec<Value> = objects
                .iter()
                .map(|o| self.render_value(o, term, walk))
                .collect();
            let multi = term.map_or(false, |t| t.container == Container::Set);
            let value = if values.len() == 1 && !multi {
                values.into_iter().next().unwrap_or(Value::Null)
            } else {
                Value::Array(values)
            };
            node.insert(field, value);
        }
        walk.stack.remove(&key);
        node
    }

    fn render_value(
        &self,
        object: &Term,
        term: Option<&TermDefinition>,
        walk: &mut Walk,
    ) -> Value {
        let node_valued = term.map_or(false, TermDefinition::is_node_valued);
        match object {
            Term::NamedNode(n) => match term.and_then(|t| t.term_type.as_ref()) {
                Some(TermType::Vocab) => Value::String(self.compact_vocab(n.as_str())),
                Some(TermType::Id) => Value::String(n.as_str().to_string()),
                _ => json!({ JSONLD_ID: n.as_str() }),
            },
            Term::BlankNode(b) => {
                let key = format!("_:{}", b.as_str());
                if self.is_embeddable(b) && !walk.stack.contains(&key) {
                    walk.embedded.insert(key);
                    let subject = NamedOrBlankNode::BlankNode(b.clone());
                    Value::Object(self.render_node(&subject, false, walk))
                } else if node_valued {
                    Value::String(key)
                } else {
                    json!({ JSONLD_ID: key })
                }
            }
            Term::Literal(l) => render_literal(l, term),
            #[allow(unreachable_patterns)]
            other => Value::String(other.to_string()),
        }
    }

    /// Uses a context term name for vocabulary IRIs that have one.
    fn compact_vocab(&self, iri: &str) -> String {
        self.context
            .terms()
            .find(|t| t.iri.as_str() == iri && t.term_type.is_none() && t.container == Container::Single)
            .map_or_else(|| iri.to_string(), |t| t.name.clone())
    }
}

fn render_literal(literal: &Literal, term: Option<&TermDefinition>) -> Value {
    if let Some(language) = literal.language() {
        if term.and_then(|t| t.language.as_deref()) == Some(language) {
            return Value::String(literal.value().to_string());
        }
        return json!({ JSONLD_VALUE: literal.value(), JSONLD_LANGUAGE: language });
    }
    let datatype = literal.datatype();
    if let Some(TermType::Datatype(dt)) = term.and_then(|t| t.term_type.as_ref()) {
        if dt.as_ref() == datatype {
            return Value::String(literal.value().to_string());
        }
    }
    if datatype == XSD_STRING {
        return Value::String(literal.value().to_string());
    }
    if datatype == XSD_BOOLEAN {
        if let Ok(b) = literal.value().parse::<bool>() {
            return Value::Bool(b);
        }
    }
    if datatype == XSD_INTEGER {
        if let Ok(i) = literal.value().parse::<i64>() {
            return json!(i);
        }
    }
    json!({ JSONLD_VALUE: literal.value(), JSONLD_TYPE: datatype.as_str() })
}
