//! Shape descriptors: the schema, shape label and JSON-LD context that together
//! define how a kind of linked data object maps onto quads.

use crate::context::Context;
use crate::shex::Schema;
use anyhow::Result;
use log::debug;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
struct ShapeDescriptorFile {
    schema: serde_json::Value,
    shape: String,
    context: serde_json::Value,
}

/// Immutable once constructed; share it between objects with `Arc`.
#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    schema: Schema,
    shape: String,
    context: Context,
}

impl ShapeDescriptor {
    pub fn new(schema: Schema, shape: impl Into<String>, context: Context) -> Self {
        Self {
            schema,
            shape: shape.into(),
            context,
        }
    }

    /// Builds a descriptor from `{"schema": ShExJ, "shape": label, "context": JSON-LD context}`.
    pub fn from_json(value: &serde_json::Value) -> Result<Arc<Self>> {
        let file: ShapeDescriptorFile = serde_json::from_value(value.clone())?;
        Self::from_parts(file)
    }

    pub fn from_file(path: &Path) -> Result<Arc<Self>> {
        debug!("Reading shape descriptor: {}", path.display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let file: ShapeDescriptorFile = serde_json::from_reader(reader)?;
        Self::from_parts(file)
    }

    fn from_parts(file: ShapeDescriptorFile) -> Result<Arc<Self>> {
        let schema = Schema::from_json(&file.schema)?;
        let context = Context::from_json(&file.context)?;
        Ok(Arc::new(Self::new(schema, file.shape, context)))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_json() {
        let descriptor = ShapeDescriptor::from_json(&json!({
            "schema": {"type": "Schema", "shapes": [{"type": "Shape", "id": "https://example.com/S"}]},
            "shape": "https://example.com/S",
            "context": {"name": "http://xmlns.com/foaf/0.1/name"}
        }))
        .unwrap();
        assert_eq!(descriptor.shape(), "https://example.com/S");
        assert!(descriptor.schema().shape("https://example.com/S").is_some());
        assert!(descriptor.context().term("name").is_some());
    }

    #[test]
    fn test_descriptor_requires_shape() {
        assert!(ShapeDescriptor::from_json(&json!({"schema": {}, "context": {}})).is_err());
    }
}
