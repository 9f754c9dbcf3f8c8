//! Typed field access on an entry node, driven by a JSON-LD context.
//!
//! A field name resolves through the context to a predicate. Reading a field
//! returns the objects of `(entry, predicate, ?, ?)` quads; writing replaces or
//! adds quads in the object's write graph. Arrays are repeated predicates and
//! nested JSON objects become linked nodes with their own fields.

use crate::context::{Context, TermDefinition, TermType};
use crate::convert::node_to_json_ld;
use crate::consts::*;
use crate::errors::LdoError;
use crate::node::{normalize_iri, normalize_node};
use crate::store::GraphStore;
use anyhow::{Error, Result};
use log::trace;
use oxigraph::model::{
    BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term,
};
use serde_json::{Map, Number, Value};

/// One value of a field: a literal or a reference to another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Literal(Literal),
    Node(NamedOrBlankNode),
}

impl FieldValue {
    fn from_term(term: Term) -> Option<Self> {
        match term {
            Term::NamedNode(n) => Some(FieldValue::Node(n.into())),
            Term::BlankNode(b) => Some(FieldValue::Node(b.into())),
            Term::Literal(l) => Some(FieldValue::Literal(l)),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    pub fn to_term(&self) -> Term {
        match self {
            FieldValue::Literal(l) => l.clone().into(),
            FieldValue::Node(n) => n.clone().into(),
        }
    }

    /// The lexical value of a literal, or the IRI / `_:label` of a node.
    pub fn as_str(&self) -> String {
        match self {
            FieldValue::Literal(l) => l.value().to_string(),
            FieldValue::Node(NamedOrBlankNode::NamedNode(n)) => n.as_str().to_string(),
            FieldValue::Node(NamedOrBlankNode::BlankNode(b)) => format!("_:{}", b.as_str()),
        }
    }

    pub fn as_node(&self) -> Option<&NamedOrBlankNode> {
        match self {
            FieldValue::Node(n) => Some(n),
            FieldValue::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            FieldValue::Literal(l) => Some(l),
            FieldValue::Node(_) => None,
        }
    }
}

/// Conversion of plain Rust values into field values, typed by the field's definition.
pub trait IntoFieldValue {
    fn into_field_value(self, term: &TermDefinition, context: &Context) -> Result<FieldValue>;
}

fn typed_literal(lexical: String, term: &TermDefinition, fallback: Literal) -> Literal {
    match &term.term_type {
        Some(TermType::Datatype(dt)) if dt.as_ref() != fallback.datatype() => {
            Literal::new_typed_literal(lexical, dt.clone())
        }
        _ => fallback,
    }
}

impl IntoFieldValue for &str {
    fn into_field_value(self, term: &TermDefinition, context: &Context) -> Result<FieldValue> {
        match &term.term_type {
            Some(TermType::Id) | Some(TermType::Vocab) => {
                Ok(FieldValue::Node(node_from_str(self, term, context)?))
            }
            Some(TermType::Datatype(dt)) => Ok(FieldValue::Literal(Literal::new_typed_literal(
                self,
                dt.clone(),
            ))),
            None => match &term.language {
                Some(language) => Ok(FieldValue::Literal(
                    Literal::new_language_tagged_literal(self, language.as_str())?,
                )),
                None => Ok(FieldValue::Literal(Literal::new_simple_literal(self))),
            },
        }
    }
}

impl IntoFieldValue for String {
    fn into_field_value(self, term: &TermDefinition, context: &Context) -> Result<FieldValue> {
        self.as_str().into_field_value(term, context)
    }
}

impl IntoFieldValue for &String {
    fn into_field_value(self, term: &TermDefinition, context: &Context) -> Result<FieldValue> {
        self.as_str().into_field_value(term, context)
    }
}

impl IntoFieldValue for i64 {
    fn into_field_value(self, term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Literal(typed_literal(
            self.to_string(),
            term,
            Literal::from(self),
        )))
    }
}

impl IntoFieldValue for f64 {
    fn into_field_value(self, term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Literal(typed_literal(
            self.to_string(),
            term,
            Literal::from(self),
        )))
    }
}

impl IntoFieldValue for bool {
    fn into_field_value(self, term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Literal(typed_literal(
            self.to_string(),
            term,
            Literal::from(self),
        )))
    }
}

impl IntoFieldValue for Literal {
    fn into_field_value(self, _term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Literal(self))
    }
}

impl IntoFieldValue for NamedNode {
    fn into_field_value(self, _term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Node(self.into()))
    }
}

impl IntoFieldValue for BlankNode {
    fn into_field_value(self, _term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Node(self.into()))
    }
}

impl IntoFieldValue for NamedOrBlankNode {
    fn into_field_value(self, _term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(FieldValue::Node(self))
    }
}

impl IntoFieldValue for FieldValue {
    fn into_field_value(self, _term: &TermDefinition, _context: &Context) -> Result<FieldValue> {
        Ok(self)
    }
}

/// Resolves an `@id` value: `_:label`, an absolute IRI or a compact IRI.
pub fn resolve_id(value: &str, context: &Context) -> Result<NamedOrBlankNode> {
    if value.starts_with("_:") {
        return normalize_node(value);
    }
    if value.contains(':') {
        return Ok(normalize_iri(&context.expand_iri(value))?.into());
    }
    Ok(normalize_iri(value)?.into())
}

/// Resolves a string naming a node; vocabulary-typed fields also accept term names.
fn node_from_str(value: &str, term: &TermDefinition, context: &Context) -> Result<NamedOrBlankNode> {
    match term.term_type {
        Some(TermType::Vocab) if !value.starts_with("_:") => {
            Ok(normalize_iri(&context.expand_iri(value))?.into())
        }
        _ => resolve_id(value, context),
    }
}

fn invalid_value(field: &str, reason: impl Into<String>) -> Error {
    Error::new(LdoError::InvalidFieldValue {
        field: field.to_string(),
        reason: reason.into(),
    })
}

/// A field view rooted at one node of a store.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    store: &'a GraphStore,
    context: &'a Context,
    subject: NamedOrBlankNode,
    write_graph: &'a GraphName,
}

impl<'a> Fields<'a> {
    pub fn new(
        store: &'a GraphStore,
        context: &'a Context,
        subject: NamedOrBlankNode,
        write_graph: &'a GraphName,
    ) -> Self {
        Self {
            store,
            context,
            subject,
            write_graph,
        }
    }

    /// The node this view is rooted at.
    pub fn id(&self) -> &NamedOrBlankNode {
        &self.subject
    }

    pub fn term(&self, field: &str) -> Result<&'a TermDefinition> {
        self.context
            .term(field)
            .ok_or_else(|| Error::new(LdoError::UnknownField(field.to_string())))
    }

    fn field_quads(&self, term: &TermDefinition) -> Vec<Quad> {
        self.store.quads_for_pattern(
            Some(self.subject.as_ref()),
            Some(term.iri.as_ref()),
            None,
            None,
        )
    }

    /// Every value of a field, deduplicated across graphs.
    pub fn get_all(&self, field: &str) -> Result<Vec<FieldValue>> {
        let term = self.term(field)?;
        let mut values: Vec<FieldValue> = vec![];
        for quad in self.field_quads(term) {
            if let Some(value) = FieldValue::from_term(quad.object) {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    /// The first value of a field.
    pub fn get(&self, field: &str) -> Result<Option<FieldValue>> {
        Ok(self.get_all(field)?.into_iter().next())
    }

    pub fn get_str(&self, field: &str) -> Result<Option<String>> {
        Ok(self.get(field)?.map(|v| v.as_str()))
    }

    pub fn has(&self, field: &str) -> Result<bool> {
        let term = self.term(field)?;
        Ok(!self.field_quads(term).is_empty())
    }

    /// The field view of the node a field links to.
    pub fn object(&self, field: &str) -> Result<Option<Fields<'a>>> {
        Ok(self.objects(field)?.into_iter().next())
    }

    pub fn objects(&self, field: &str) -> Result<Vec<Fields<'a>>> {
        Ok(self
            .get_all(field)?
            .into_iter()
            .filter_map(|v| match v {
                FieldValue::Node(node) => Some(self.at(node)),
                FieldValue::Literal(_) => None,
            })
            .collect())
    }

    fn at(&self, subject: NamedOrBlankNode) -> Fields<'a> {
        Fields::new(self.store, self.context, subject, self.write_graph)
    }

    fn insert_value(&self, term: &TermDefinition, value: FieldValue) {
        let quad = Quad::new(
            self.subject.clone(),
            term.iri.clone(),
            value.to_term(),
            self.write_graph.clone(),
        );
        trace!("Adding {}", quad);
        self.store.insert(&quad);
    }

    /// Removes every value of a field, in every graph.
    pub fn clear(&self, field: &str) -> Result<()> {
        let term = self.term(field)?;
        for quad in self.field_quads(term) {
            trace!("Removing {}", quad);
            self.store.remove(&quad);
        }
        Ok(())
    }

    /// Replaces a field's values with a single value.
    pub fn set(&self, field: &str, value: impl IntoFieldValue) -> Result<()> {
        let term = self.term(field)?;
        let value = value.into_field_value(term, self.context)?;
        self.clear(field)?;
        self.insert_value(term, value);
        Ok(())
    }

    /// Replaces a field's values with the given values.
    pub fn set_all<V: IntoFieldValue>(
        &self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<()> {
        let term = self.term(field)?;
        let values = values
            .into_iter()
            .map(|v| v.into_field_value(term, self.context))
            .collect::<Result<Vec<_>>>()?;
        self.clear(field)?;
        for value in values {
            self.insert_value(term, value);
        }
        Ok(())
    }

    /// Adds a value next to the existing ones.
    pub fn add(&self, field: &str, value: impl IntoFieldValue) -> Result<()> {
        let term = self.term(field)?;
        let value = value.into_field_value(term, self.context)?;
        self.insert_value(term, value);
        Ok(())
    }

    /// Removes one value of a field from every graph; returns whether it was present.
    pub fn remove_value(&self, field: &str, value: impl IntoFieldValue) -> Result<bool> {
        let term = self.term(field)?;
        let object = value.into_field_value(term, self.context)?.to_term();
        let quads = self.store.quads_for_pattern(
            Some(self.subject.as_ref()),
            Some(term.iri.as_ref()),
            Some(object.as_ref()),
            None,
        );
        for quad in &quads {
            self.store.remove(quad);
        }
        Ok(!quads.is_empty())
    }

    /// The graphs holding a field's quads.
    pub fn graph_of(&self, field: &str) -> Result<Vec<GraphName>> {
        let term = self.term(field)?;
        let mut graphs: Vec<GraphName> = vec![];
        for quad in self.field_quads(term) {
            if !graphs.contains(&quad.graph_name) {
                graphs.push(quad.graph_name);
            }
        }
        Ok(graphs)
    }

    /// Replaces a field's values with the RDF form of a JSON value.
    pub fn set_json(&self, field: &str, value: &Value) -> Result<()> {
        self.term(field)?;
        self.clear(field)?;
        self.add_json(field, value)
    }

    /// Adds the RDF form of a JSON value to a field. Arrays add every element,
    /// `null` adds nothing, and objects without `@value` become linked nodes.
    pub fn add_json(&self, field: &str, value: &Value) -> Result<()> {
        let term = self.term(field)?;
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => items.iter().try_for_each(|v| self.add_json(field, v)),
            Value::Bool(b) => self.add(field, *b),
            Value::Number(n) => self.add(field, number_literal(field, n, term)?),
            Value::String(s) => self.add(field, s.as_str()),
            Value::Object(obj) => self.add_json_object(field, term, obj),
        }
    }

    fn add_json_object(
        &self,
        field: &str,
        term: &TermDefinition,
        obj: &Map<String, Value>,
    ) -> Result<()> {
        if let Some(value) = obj.get(JSONLD_VALUE) {
            let literal = value_object_literal(field, value, obj, self.context)?;
            self.insert_value(term, FieldValue::Literal(literal));
            return Ok(());
        }
        let id = obj
            .get(self.context.id_key())
            .or_else(|| obj.get(JSONLD_ID))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());
        let node = match id {
            Some(id) => node_from_str(id, term, self.context)?,
            None => BlankNode::default().into(),
        };
        self.insert_value(term, FieldValue::Node(node.clone()));
        self.at(node).assign_json(obj)
    }

    /// Assigns every field of a JSON object onto this node, skipping the id key
    /// and `@context`.
    pub fn assign_json(&self, obj: &Map<String, Value>) -> Result<()> {
        for (key, value) in obj {
            if key == self.context.id_key() || key == JSONLD_ID || key == JSONLD_CONTEXT {
                continue;
            }
            self.set_json(key, value)?;
        }
        Ok(())
    }

    /// The node and everything reachable through embedded blank nodes, as JSON-LD.
    pub fn to_json(&self) -> Value {
        node_to_json_ld(&self.store.quads(), &self.subject, self.context)
    }
}

fn number_literal(field: &str, number: &Number, term: &TermDefinition) -> Result<Literal> {
    let fallback = if let Some(i) = number.as_i64() {
        Literal::from(i)
    } else if let Some(f) = number.as_f64() {
        Literal::from(f)
    } else {
        return Err(invalid_value(field, format!("unsupported number {}", number)));
    };
    Ok(typed_literal(number.to_string(), term, fallback))
}

fn value_object_literal(
    field: &str,
    value: &Value,
    obj: &Map<String, Value>,
    context: &Context,
) -> Result<Literal> {
    let lexical = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(invalid_value(field, format!("invalid @value {}", other))),
    };
    if let Some(language) = obj.get(JSONLD_LANGUAGE).and_then(Value::as_str) {
        return Literal::new_language_tagged_literal(lexical, language)
            .map_err(|e| invalid_value(field, e.to_string()));
    }
    match obj.get(JSONLD_TYPE).and_then(Value::as_str) {
        Some(datatype) => {
            let datatype = normalize_iri(&context.expand_iri(datatype))?;
            Ok(Literal::new_typed_literal(lexical, datatype))
        }
        None => Ok(Literal::new_simple_literal(lexical)),
    }
}
