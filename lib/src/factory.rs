//! Builds linked data objects of one shape from parsed data or field values.

use crate::consts::JSONLD_ID;
use crate::fields::resolve_id;
use crate::ldo::LinkedDataObject;
use crate::node::{normalize_node, NodeInput};
use crate::options::EntryNodePolicy;
use crate::parse::{ingest, ParseOptions, RdfInput};
use crate::shape::ShapeDescriptor;
use crate::context::Context;
use crate::store::SharedDataset;
use anyhow::Result;
use log::debug;
use oxigraph::model::{BlankNode, NamedOrBlankNode};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Picks the entry node for an object created from `fields`.
pub(crate) fn entry_node(
    fields: &Map<String, Value>,
    context: &Context,
    policy: EntryNodePolicy,
) -> Result<NamedOrBlankNode> {
    if policy.uses_provided_id() {
        let id = fields
            .get(context.id_key())
            .or_else(|| fields.get(JSONLD_ID))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());
        if let Some(id) = id {
            return resolve_id(id, context);
        }
    }
    Ok(BlankNode::default().into())
}

#[derive(Debug, Clone)]
pub struct LdoFactory {
    shape: Arc<ShapeDescriptor>,
}

impl LdoFactory {
    pub fn new(shape: Arc<ShapeDescriptor>) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &Arc<ShapeDescriptor> {
        &self.shape
    }

    /// Builds an object at `entry` over the given data, in a fresh transaction.
    pub fn parse(
        &self,
        entry: impl Into<NodeInput>,
        data: impl Into<RdfInput>,
        options: &ParseOptions,
    ) -> Result<LinkedDataObject> {
        let entry = normalize_node(entry)?;
        let dataset = ingest(data.into(), options)?;
        debug!("Parsed {} quads for {}", dataset.len(), entry);
        Ok(LinkedDataObject::new(
            dataset.start_transaction().into(),
            self.shape.clone(),
            entry,
        ))
    }

    /// Builds an object from plain field values over a new dataset. The fields
    /// are written before the transaction starts, so its diff begins empty.
    pub fn create(
        &self,
        fields: &Map<String, Value>,
        policy: EntryNodePolicy,
    ) -> Result<LinkedDataObject> {
        let context = self.shape.context();
        let entry = entry_node(fields, context, policy)?;
        let dataset = SharedDataset::new();
        let ldo = LinkedDataObject::new(dataset.clone().into(), self.shape.clone(), entry.clone());
        ldo.fields().assign_json(fields)?;
        Ok(LinkedDataObject::new(
            dataset.start_transaction().into(),
            self.shape.clone(),
            entry,
        ))
    }

    /// An empty object at `entry`, or at a fresh blank node, in a transaction.
    pub fn new_object(&self, entry: Option<NodeInput>) -> Result<LinkedDataObject> {
        let entry = match entry {
            Some(entry) => normalize_node(entry)?,
            None => BlankNode::default().into(),
        };
        let dataset = SharedDataset::new();
        Ok(LinkedDataObject::new(
            dataset.start_transaction().into(),
            self.shape.clone(),
            entry,
        ))
    }
}
