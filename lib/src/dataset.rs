//! A dataset from which linked data objects of any shape are obtained.

use crate::convert::{dataset_to_string, SerializeOptions};
use crate::factory::entry_node;
use crate::ldo::LinkedDataObject;
use crate::node::{normalize_node, NodeInput};
use crate::options::{EntryNodePolicy, TransactionMode};
use crate::parse::{ingest, ParseOptions, RdfInput};
use crate::shape::ShapeDescriptor;
use crate::store::{GraphStore, SharedDataset, Transaction};
use anyhow::Result;
use log::debug;
use oxigraph::model::{
    GraphName, GraphNameRef, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, Term,
    TermRef,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A shared dataset that can hand out linked data objects.
#[derive(Debug, Clone, Default)]
pub struct LdoDataset {
    dataset: SharedDataset,
}

impl LdoDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> &SharedDataset {
        &self.dataset
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn quads(&self) -> Vec<Quad> {
        self.dataset.quads()
    }

    pub fn add_all(&self, quads: impl IntoIterator<Item = Quad>) {
        self.dataset.add_all(quads)
    }

    pub fn start_transaction(&self) -> Transaction {
        self.dataset.start_transaction()
    }

    pub fn serialize(&self, options: &SerializeOptions) -> Result<String> {
        dataset_to_string(&self.dataset.to_dataset(), options)
    }

    /// A builder for objects of `shape` over this dataset.
    pub fn using_shape(&self, shape: Arc<ShapeDescriptor>) -> LdoBuilder {
        LdoBuilder {
            dataset: self.dataset.clone(),
            shape,
            write_graph: GraphName::DefaultGraph,
            mode: TransactionMode::Direct,
        }
    }
}

impl From<SharedDataset> for LdoDataset {
    fn from(dataset: SharedDataset) -> Self {
        Self { dataset }
    }
}

/// Wraps initial data (quads, a dataset or serialized Turtle) in an `LdoDataset`.
pub fn create_ldo_dataset(initial: impl Into<RdfInput>) -> Result<LdoDataset> {
    parse_rdf(initial, &ParseOptions::default())
}

/// Parses or wraps any supported input into an `LdoDataset`.
pub fn parse_rdf(data: impl Into<RdfInput>, options: &ParseOptions) -> Result<LdoDataset> {
    Ok(ingest(data.into(), options)?.into())
}

/// Obtains objects of one shape from a dataset.
#[derive(Debug, Clone)]
pub struct LdoBuilder {
    dataset: SharedDataset,
    shape: Arc<ShapeDescriptor>,
    write_graph: GraphName,
    mode: TransactionMode,
}

impl LdoBuilder {
    /// The graph that objects from this builder write into.
    pub fn write_graph(mut self, graph: impl Into<GraphName>) -> Self {
        self.write_graph = graph.into();
        self
    }

    /// Whether objects from this builder start in a transaction.
    pub fn transaction_mode(mut self, mode: impl Into<TransactionMode>) -> Self {
        self.mode = mode.into();
        self
    }

    fn build(&self, entry: NamedOrBlankNode) -> LinkedDataObject {
        let store: GraphStore = if self.mode.is_transactional() {
            self.dataset.start_transaction().into()
        } else {
            self.dataset.clone().into()
        };
        LinkedDataObject::new(store, self.shape.clone(), entry)
            .with_write_graph(self.write_graph.clone())
    }

    pub fn from_subject(&self, entry: impl Into<NodeInput>) -> Result<LinkedDataObject> {
        Ok(self.build(normalize_node(entry)?))
    }

    /// Writes `fields` into the dataset and returns the object they describe.
    /// The entry node is the `@id` field when present, else a fresh blank node.
    pub fn from_json(&self, fields: &Map<String, Value>) -> Result<LinkedDataObject> {
        let entry = entry_node(fields, self.shape.context(), EntryNodePolicy::UseProvidedId)?;
        let ldo = self.build(entry);
        ldo.fields().assign_json(fields)?;
        Ok(ldo)
    }

    /// Objects for each distinct subject of the quads matching the pattern.
    pub fn match_subject(
        &self,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph: Option<GraphNameRef<'_>>,
    ) -> Vec<LinkedDataObject> {
        let mut subjects: Vec<NamedOrBlankNode> = vec![];
        for quad in self.dataset.quads_for_pattern(None, predicate, object, graph) {
            if !subjects.contains(&quad.subject) {
                subjects.push(quad.subject);
            }
        }
        debug!("Matched {} subjects", subjects.len());
        subjects.into_iter().map(|s| self.build(s)).collect()
    }

    /// Objects for each distinct non-literal object of the quads matching the pattern.
    pub fn match_object(
        &self,
        subject: Option<NamedOrBlankNodeRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        graph: Option<GraphNameRef<'_>>,
    ) -> Vec<LinkedDataObject> {
        let mut objects: Vec<NamedOrBlankNode> = vec![];
        for quad in self.dataset.quads_for_pattern(subject, predicate, None, graph) {
            let node: NamedOrBlankNode = match quad.object {
                Term::NamedNode(n) => n.into(),
                Term::BlankNode(b) => b.into(),
                _ => continue,
            };
            if !objects.contains(&node) {
                objects.push(node);
            }
        }
        debug!("Matched {} objects", objects.len());
        objects.into_iter().map(|o| self.build(o)).collect()
    }
}
