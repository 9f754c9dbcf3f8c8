//! JSON-LD context handling: maps field names to predicate IRIs and value types.
//!
//! Only the parts of a context that affect how fields map onto quads are
//! interpreted: prefixes, `@vocab`, keyword aliases and expanded term
//! definitions with `@id`, `@type`, `@container` and `@language`.

use crate::consts::*;
use anyhow::{anyhow, Result};
use log::warn;
use oxigraph::model::{NamedNode, NamedNodeRef};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const MAX_EXPANSION_DEPTH: usize = 8;

/// What kind of RDF term a field's values become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermType {
    /// `"@type": "@id"`: string values are IRIs
    Id,
    /// `"@type": "@vocab"` (and `@type` aliases): string values are vocabulary-relative IRIs
    Vocab,
    /// string values are literals with this datatype
    Datatype(NamedNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    /// one value, rendered as a scalar
    #[default]
    Single,
    /// any number of values, rendered as an array
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    pub name: String,
    pub iri: NamedNode,
    pub term_type: Option<TermType>,
    pub container: Container,
    pub language: Option<String>,
}

impl TermDefinition {
    pub fn is_multi_valued(&self) -> bool {
        self.container == Container::Set
    }

    /// Returns true if string values of this field denote nodes rather than literals.
    pub fn is_node_valued(&self) -> bool {
        matches!(self.term_type, Some(TermType::Id) | Some(TermType::Vocab))
    }
}

/// A parsed JSON-LD context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    terms: BTreeMap<String, TermDefinition>,
    raw_iris: BTreeMap<String, String>,
    vocab: Option<String>,
    id_alias: Option<String>,
    type_alias: Option<String>,
    source: Value,
}

impl Context {
    /// Parses a context from its JSON form. Accepts either the context object
    /// itself, an array of context objects, or a document with an `@context` key.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut context = Context {
            source: value.clone(),
            ..Default::default()
        };
        let value = match value.get(JSONLD_CONTEXT) {
            Some(inner) => inner,
            None => value,
        };
        let objects: Vec<&Map<String, Value>> = match value {
            Value::Object(obj) => vec![obj],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_object()
                        .ok_or_else(|| anyhow!("Remote contexts are not supported: {}", item))
                })
                .collect::<Result<_>>()?,
            Value::Null => vec![],
            other => return Err(anyhow!("Invalid JSON-LD context: {}", other)),
        };

        // first pass: keywords, aliases and raw IRIs so later expansion can see every prefix
        for obj in &objects {
            for (key, def) in obj.iter() {
                if key == JSONLD_VOCAB {
                    context.vocab = def.as_str().map(str::to_string);
                    continue;
                }
                if key.starts_with('@') {
                    continue;
                }
                match def {
                    Value::String(s) if s == JSONLD_ID => context.id_alias = Some(key.clone()),
                    Value::String(s) if s == JSONLD_TYPE => context.type_alias = Some(key.clone()),
                    Value::String(s) => {
                        context.raw_iris.insert(key.clone(), s.clone());
                    }
                    Value::Object(o) => match o.get(JSONLD_ID).and_then(Value::as_str) {
                        Some(JSONLD_TYPE) => {
                            context.type_alias = Some(key.clone());
                        }
                        Some(id) => {
                            context.raw_iris.insert(key.clone(), id.to_string());
                        }
                        None => {}
                    },
                    _ => {}
                }
            }
        }

        // second pass: term definitions
        for obj in &objects {
            for (key, def) in obj.iter() {
                if key.starts_with('@') {
                    continue;
                }
                if let Some(term) = context.parse_term(key, def)? {
                    context.terms.insert(key.clone(), term);
                }
            }
        }
        if context.type_alias.is_none() {
            context.terms.insert(
                JSONLD_TYPE.to_string(),
                TermDefinition {
                    name: JSONLD_TYPE.to_string(),
                    iri: TYPE.into_owned(),
                    term_type: Some(TermType::Vocab),
                    container: Container::Set,
                    language: None,
                },
            );
        }
        Ok(context)
    }

    fn parse_term(&self, key: &str, def: &Value) -> Result<Option<TermDefinition>> {
        if Some(key) == self.id_alias.as_deref() {
            return Ok(None);
        }
        if Some(key) == self.type_alias.as_deref() {
            let container = match def.get(JSONLD_CONTAINER).and_then(Value::as_str) {
                Some(JSONLD_SET) | Some(JSONLD_LIST) => Container::Set,
                _ => Container::Single,
            };
            return Ok(Some(TermDefinition {
                name: key.to_string(),
                iri: TYPE.into_owned(),
                term_type: Some(TermType::Vocab),
                container,
                language: None,
            }));
        }
        let (iri, obj) = match def {
            Value::String(s) => (s.clone(), None),
            Value::Object(o) => match o.get(JSONLD_ID).and_then(Value::as_str) {
                Some(id) => (id.to_string(), Some(o)),
                None => match &self.vocab {
                    Some(vocab) => (format!("{}{}", vocab, key), Some(o)),
                    None => {
                        warn!("Skipping context term '{}' without @id", key);
                        return Ok(None);
                    }
                },
            },
            Value::Null => return Ok(None),
            other => return Err(anyhow!("Invalid term definition for '{}': {}", key, other)),
        };
        let iri = match NamedNode::new(self.expand_iri(&iri)) {
            Ok(iri) => iri,
            Err(e) => {
                warn!("Skipping context term '{}': {}", key, e);
                return Ok(None);
            }
        };

        let mut term_type = None;
        let mut container = Container::Single;
        let mut language = None;
        if let Some(obj) = obj {
            term_type = match obj.get(JSONLD_TYPE).and_then(Value::as_str) {
                Some(JSONLD_ID) => Some(TermType::Id),
                Some("@vocab") => Some(TermType::Vocab),
                Some(dt) => Some(TermType::Datatype(NamedNode::new(self.expand_iri(dt))?)),
                None => None,
            };
            container = match obj.get(JSONLD_CONTAINER).and_then(Value::as_str) {
                Some(JSONLD_SET) => Container::Set,
                Some(JSONLD_LIST) => {
                    warn!("Treating @list container of '{}' as an unordered set", key);
                    Container::Set
                }
                _ => Container::Single,
            };
            language = obj
                .get(JSONLD_LANGUAGE)
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(Some(TermDefinition {
            name: key.to_string(),
            iri,
            term_type,
            container,
            language,
        }))
    }

    /// Expands a compact IRI, term or vocabulary-relative name into an absolute IRI string.
    pub fn expand_iri(&self, value: &str) -> String {
        self.expand_iri_depth(value, 0)
    }

    fn expand_iri_depth(&self, value: &str, depth: usize) -> String {
        if depth > MAX_EXPANSION_DEPTH {
            return value.to_string();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if suffix.starts_with("//") {
                return value.to_string();
            }
            if let Some(base) = self.raw_iris.get(prefix) {
                let base = self.expand_iri_depth(base, depth + 1);
                return format!("{}{}", base, suffix);
            }
            return value.to_string();
        }
        if let Some(raw) = self.raw_iris.get(value) {
            return self.expand_iri_depth(raw, depth + 1);
        }
        match &self.vocab {
            Some(vocab) => format!("{}{}", vocab, value),
            None => value.to_string(),
        }
    }

    /// Looks up the definition of a field.
    ///
    /// `@type` always resolves, to the aliased definition when the context has one.
    pub fn term(&self, field: &str) -> Option<&TermDefinition> {
        if field == JSONLD_TYPE {
            if let Some(alias) = &self.type_alias {
                return self.terms.get(alias);
            }
        }
        self.terms.get(field)
    }

    /// Finds the field that maps to a predicate, preferring the first definition by name.
    pub fn term_for_predicate(&self, predicate: NamedNodeRef<'_>) -> Option<&TermDefinition> {
        self.terms.values().find(|t| t.iri.as_ref() == predicate)
    }

    pub fn terms(&self) -> impl Iterator<Item = &TermDefinition> {
        self.terms.values()
    }

    /// The key under which a node's identifier appears in documents, `@id` unless aliased.
    pub fn id_key(&self) -> &str {
        self.id_alias.as_deref().unwrap_or(JSONLD_ID)
    }

    /// The key under which `rdf:type` appears in documents, `@type` unless aliased.
    pub fn type_key(&self) -> &str {
        self.type_alias.as_deref().unwrap_or(JSONLD_TYPE)
    }

    /// The context as it was given.
    pub fn as_json(&self) -> &Value {
        &self.source
    }
}
