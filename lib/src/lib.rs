//! Linked data objects: typed, shape-bound views over RDF datasets whose
//! mutations are recorded as transaction diffs and rendered as SPARQL Update,
//! Turtle, N-Triples or JSON-LD.
//!
//! ```no_run
//! use ldo::{LdoFactory, ParseOptions, ShapeDescriptor};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let shape = ShapeDescriptor::from_file(Path::new("profile_shape.json"))?;
//! let factory = LdoFactory::new(shape);
//! let ldo = factory.parse(
//!     "https://example.com/item",
//!     r#"<https://example.com/item> <http://xmlns.com/foaf/0.1/name> "Mr. Cool Dude" ."#,
//!     &ParseOptions::default(),
//! )?;
//! ldo.fields().set("name", "Captain of Coolness")?;
//! println!("{}", ldo.to_sparql_update()?);
//! # Ok(())
//! # }
//! ```

pub mod consts;
pub mod context;
pub mod convert;
pub mod dataset;
pub mod errors;
pub mod factory;
pub mod fields;
pub mod ldo;
pub mod node;
pub mod options;
pub mod parse;
pub mod shape;
pub mod shex;
pub mod sparql;
pub mod store;
pub mod util;

pub use crate::context::Context;
pub use crate::convert::{OutputFormat, SerializeOptions};
pub use crate::dataset::{create_ldo_dataset, parse_rdf, LdoBuilder, LdoDataset};
pub use crate::errors::LdoError;
pub use crate::factory::LdoFactory;
pub use crate::fields::{FieldValue, Fields, IntoFieldValue};
pub use crate::ldo::LinkedDataObject;
pub use crate::options::{EntryNodePolicy, TransactionMode};
pub use crate::parse::{ParseOptions, RdfInput};
pub use crate::shape::ShapeDescriptor;
pub use crate::shex::ValidationReport;
pub use crate::store::{DatasetChanges, GraphStore, SharedDataset, Transaction};

pub fn init_logging() {
    // Allow LDO_LOG to override RUST_LOG for consistent CLI defaults.
    if let Ok(log_level) = std::env::var("LDO_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
