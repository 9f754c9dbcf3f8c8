//! The linked data object: a field view over one entry node plus the fixed
//! method surface for transactions, diffs, validation and serialization.

use crate::convert::{dataset_to_string, quads_to_json_ld, OutputFormat, SerializeOptions};
use crate::errors::LdoError;
use crate::fields::Fields;
use crate::shape::ShapeDescriptor;
use crate::shex::{ShexValidator, ValidationReport};
use crate::sparql::changes_to_sparql_update;
use crate::store::{DatasetChanges, GraphStore, SharedDataset, Transaction};
use anyhow::{Error, Result};
use log::{debug, info};
use oxigraph::model::{GraphName, NamedOrBlankNode, Term};
use std::sync::Arc;

/// A typed, shape-bound view of one node of a graph store.
///
/// Field data is reached through [`LinkedDataObject::fields`]; everything else
/// is an inherent method, so field names never shadow methods.
#[derive(Debug, Clone)]
pub struct LinkedDataObject {
    store: GraphStore,
    shape: Arc<ShapeDescriptor>,
    entry: NamedOrBlankNode,
    write_graph: GraphName,
}

impl LinkedDataObject {
    pub fn new(store: GraphStore, shape: Arc<ShapeDescriptor>, entry: NamedOrBlankNode) -> Self {
        Self {
            store,
            shape,
            entry,
            write_graph: GraphName::DefaultGraph,
        }
    }

    pub fn with_write_graph(mut self, graph: impl Into<GraphName>) -> Self {
        self.write_graph = graph.into();
        self
    }

    /// The entry node.
    pub fn id(&self) -> &NamedOrBlankNode {
        &self.entry
    }

    pub fn shape(&self) -> &Arc<ShapeDescriptor> {
        &self.shape
    }

    pub fn fields(&self) -> Fields<'_> {
        Fields::new(
            &self.store,
            self.shape.context(),
            self.entry.clone(),
            &self.write_graph,
        )
    }

    /// The backing store; the transaction itself while one is active.
    pub fn dataset(&self) -> &GraphStore {
        &self.store
    }

    pub fn is_in_transaction(&self) -> bool {
        self.store.is_transaction()
    }

    fn transaction(&self) -> Result<&Transaction> {
        self.store
            .as_transaction()
            .ok_or_else(|| Error::new(LdoError::NotInTransaction))
    }

    /// Copies every visible quad into a new dataset and returns an object on the
    /// same entry node, in a transaction over that copy.
    pub fn duplicate(&self) -> Self {
        let copy = SharedDataset::from_dataset(self.store.to_dataset());
        debug!("Duplicated {} quads for {}", copy.len(), self.entry);
        Self {
            store: copy.start_transaction().into(),
            shape: self.shape.clone(),
            entry: self.entry.clone(),
            write_graph: self.write_graph.clone(),
        }
    }

    pub fn changes(&self) -> Result<DatasetChanges> {
        Ok(self.transaction()?.changes())
    }

    pub fn to_sparql_update(&self) -> Result<String> {
        changes_to_sparql_update(&self.changes()?)
    }

    /// Moves the object into a new transaction over its dataset.
    pub fn start_transaction(&mut self) -> Result<()> {
        let transaction = self.store.start_transaction()?;
        self.store = transaction.into();
        Ok(())
    }

    /// Applies the transaction's changes to its parent and leaves the transaction.
    pub fn commit(&mut self) -> Result<()> {
        let transaction = self.transaction()?;
        let parent = transaction.parent().clone();
        transaction.commit();
        info!("Committed transaction for {}", self.entry);
        self.store = parent.into();
        Ok(())
    }

    /// Drops the transaction's changes and leaves the transaction.
    pub fn rollback(&mut self) -> Result<()> {
        let transaction = self.transaction()?;
        let parent = transaction.parent().clone();
        transaction.rollback();
        self.store = parent.into();
        Ok(())
    }

    pub fn write_graph(&self) -> &GraphName {
        &self.write_graph
    }

    /// Sets the graph that new field values are written into.
    pub fn set_write_graph(&mut self, graph: impl Into<GraphName>) {
        self.write_graph = graph.into();
    }

    /// The graphs that hold a field's values.
    pub fn graph_of(&self, field: &str) -> Result<Vec<GraphName>> {
        self.fields().graph_of(field)
    }

    /// Checks the entry node against the descriptor's shape.
    pub fn validate(&self) -> Result<ValidationReport> {
        let quads = self.store.quads();
        let focus = Term::from(self.entry.clone());
        ShexValidator::new(self.shape.schema(), &quads).validate(focus.as_ref(), self.shape.shape())
    }

    pub fn is_valid(&self) -> Result<bool> {
        Ok(self.validate()?.is_valid())
    }

    pub fn serialize(&self, options: &SerializeOptions) -> Result<String> {
        dataset_to_string(&self.store.to_dataset(), options)
    }

    pub fn to_turtle(&self) -> Result<String> {
        self.serialize(&SerializeOptions::new(OutputFormat::Turtle))
    }

    pub fn to_ntriples(&self) -> Result<String> {
        self.serialize(&SerializeOptions::new(OutputFormat::NTriples))
    }

    /// Every visible quad as JSON-LD, compacted with the descriptor's context.
    /// Graph names are not represented; see [`crate::convert::quads_to_json_ld`].
    pub fn to_json_ld(&self) -> serde_json::Value {
        quads_to_json_ld(&self.store.quads(), self.shape.context())
    }
}
