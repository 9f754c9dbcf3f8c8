use ldo::errors::ldo_error;
use ldo::parse::parse_quads;
use ldo::store::dataset_from_quads;
use ldo::{
    GraphStore, LdoError, LinkedDataObject, OutputFormat, SerializeOptions, ShapeDescriptor,
    SharedDataset,
};
use oxigraph::io::RdfFormat;
use oxigraph::model::{GraphName, Literal, NamedNode, Quad};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

const ITEM: &str = "https://example.com/item";
const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";

fn profile_shape() -> Arc<ShapeDescriptor> {
    let _ = env_logger::builder().is_test(true).try_init();
    ShapeDescriptor::from_file(Path::new("fixtures/profile/profile_shape.json")).unwrap()
}

fn item() -> NamedNode {
    NamedNode::new(ITEM).unwrap()
}

fn name_quad(value: &str) -> Quad {
    Quad::new(
        item(),
        NamedNode::new(FOAF_NAME).unwrap(),
        Literal::new_simple_literal(value),
        GraphName::DefaultGraph,
    )
}

/// An object on https://example.com/item in a transaction over `parent`.
fn profile_ldo(parent: &SharedDataset) -> LinkedDataObject {
    LinkedDataObject::new(
        parent.start_transaction().into(),
        profile_shape(),
        item().into(),
    )
}

#[test]
fn test_clone_isolates_mutation() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    let cloned = ldo.duplicate();
    cloned.fields().set("name", "Beeboo").unwrap();
    assert_eq!(
        cloned.fields().get_str("name").unwrap().as_deref(),
        Some("Beeboo")
    );
    assert_eq!(cloned.dataset().len(), 1);
    assert_eq!(ldo.dataset().len(), 0);
    assert_eq!(cloned.id(), ldo.id());
}

#[test]
fn test_changes() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Beeboo").unwrap();
    let changes = ldo.changes().unwrap();
    assert_eq!(changes.added.map(|d| d.len()), Some(1));
    assert!(changes.removed.is_none());
}

#[test]
fn test_changes_right_after_begin_are_empty() {
    let parent = SharedDataset::from_quads([name_quad("Mr. Cool Dude")]);
    let ldo = profile_ldo(&parent);
    let changes = ldo.changes().unwrap();
    assert!(changes.added.is_none());
    assert!(changes.removed.is_none());
    assert_eq!(ldo.to_sparql_update().unwrap(), "");
}

#[test]
fn test_set_then_overwrite() {
    let parent = SharedDataset::from_quads([name_quad("Mr. Cool Dude")]);
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Temporary").unwrap();
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    let changes = ldo.changes().unwrap();
    let added = changes.added.unwrap();
    assert_eq!(added.len(), 1);
    assert!(added.contains(&name_quad("Captain of Coolness")));
    let removed = changes.removed.unwrap();
    assert_eq!(removed.len(), 1);
    assert!(removed.contains(&name_quad("Mr. Cool Dude")));
}

#[test]
fn test_set_then_overwrite_from_empty() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Temporary").unwrap();
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    let changes = ldo.changes().unwrap();
    let added = changes.added.unwrap();
    assert_eq!(added.len(), 1);
    assert!(added.contains(&name_quad("Captain of Coolness")));
    // the intermediate value never reached the parent, so nothing is deleted
    assert!(changes.removed.is_none());
    assert_eq!(
        ldo.to_sparql_update().unwrap(),
        "INSERT DATA { <https://example.com/item> <http://xmlns.com/foaf/0.1/name> \"Captain of Coolness\" .  }"
    );
}

#[test]
fn test_sparql_update() {
    let parent = SharedDataset::from_quads([name_quad("Mr. Cool Dude")]);
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    assert_eq!(
        ldo.to_sparql_update().unwrap(),
        "DELETE DATA { <https://example.com/item> <http://xmlns.com/foaf/0.1/name> \"Mr. Cool Dude\" .  }; INSERT DATA { <https://example.com/item> <http://xmlns.com/foaf/0.1/name> \"Captain of Coolness\" .  }"
    );
}

#[test]
fn test_turtle() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    let turtle = ldo.to_turtle().unwrap();
    assert_eq!(
        turtle,
        "<https://example.com/item> <http://xmlns.com/foaf/0.1/name> \"Captain of Coolness\" .\n"
    );
    let reparsed = parse_quads(&turtle, RdfFormat::Turtle, None).unwrap();
    assert_eq!(
        dataset_from_quads(reparsed),
        dataset_from_quads([name_quad("Captain of Coolness")])
    );
}

#[test]
fn test_ntriples() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    assert_eq!(
        ldo.to_ntriples().unwrap(),
        "<https://example.com/item> <http://xmlns.com/foaf/0.1/name> \"Captain of Coolness\" .\n"
    );
}

#[test]
fn test_serialize_with_prefixes() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    let options = SerializeOptions::new(OutputFormat::Turtle)
        .with_prefix("foaf", "http://xmlns.com/foaf/0.1/");
    let turtle = ldo.serialize(&options).unwrap();
    assert!(turtle.contains("foaf:name"));
    assert_eq!(parse_quads(&turtle, RdfFormat::Turtle, None).unwrap().len(), 1);
}

#[test]
fn test_json_ld() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    assert_eq!(
        ldo.to_json_ld(),
        json!([{"@id": "https://example.com/item", "name": "Captain of Coolness"}])
    );
}

#[test]
fn test_json_ld_with_types_and_links() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    let fields = ldo.fields();
    fields.set("name", "Captain of Coolness").unwrap();
    fields
        .set_json("type", &json!([{"@id": "Person"}]))
        .unwrap();
    fields
        .set_json("inbox", &json!({"@id": "https://coolInbox.com"}))
        .unwrap();
    assert_eq!(
        fields.to_json(),
        json!({
            "@id": "https://example.com/item",
            "name": "Captain of Coolness",
            "type": ["Person"],
            "inbox": "https://coolInbox.com"
        })
    );
}

#[test]
fn test_is_valid() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    let fields = ldo.fields();
    fields.set("name", "Captain of Coolness").unwrap();
    fields
        .set_json("type", &json!([{"@id": "Person"}, {"@id": "Person2"}]))
        .unwrap();
    fields
        .set_json("inbox", &json!({"@id": "https://coolInbox.com"}))
        .unwrap();
    assert!(ldo.is_valid().unwrap());
}

#[test]
fn test_is_not_valid() {
    let parent = SharedDataset::new();
    let ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Captain of Coolness").unwrap();
    let report = ldo.validate().unwrap();
    assert!(!report.is_valid());
    assert_eq!(report.errors.len(), 2);
    assert!(!ldo.is_valid().unwrap());
}

#[test]
fn test_transaction_methods_need_a_transaction() {
    let mut ldo = LinkedDataObject::new(
        SharedDataset::new().into(),
        profile_shape(),
        item().into(),
    );
    for err in [
        ldo.changes().unwrap_err(),
        ldo.to_sparql_update().unwrap_err(),
        ldo.rollback().unwrap_err(),
        ldo.commit().unwrap_err(),
    ] {
        assert_eq!(ldo_error(&err), Some(&LdoError::NotInTransaction));
        assert_eq!(err.to_string(), "Object is not currently in a transaction");
    }
}

#[test]
fn test_plain_store_is_not_transactable() {
    let mut ldo = LinkedDataObject::new(
        GraphStore::Plain(SharedDataset::new()),
        profile_shape(),
        item().into(),
    );
    let err = ldo.start_transaction().unwrap_err();
    assert_eq!(err.to_string(), "Object is not transactable.");
}

#[test]
fn test_nested_transactions_are_rejected() {
    let parent = SharedDataset::new();
    let mut ldo = profile_ldo(&parent);
    let err = ldo.start_transaction().unwrap_err();
    assert_eq!(ldo_error(&err), Some(&LdoError::AlreadyInTransaction));
}

#[test]
fn test_commit_and_rollback() {
    let parent = SharedDataset::new();
    let mut ldo = profile_ldo(&parent);
    ldo.fields().set("name", "Joey").unwrap();
    assert_eq!(parent.len(), 0);
    ldo.commit().unwrap();
    assert_eq!(parent.len(), 1);
    assert!(!ldo.is_in_transaction());
    assert_eq!(ldo.fields().get_str("name").unwrap().as_deref(), Some("Joey"));

    ldo.start_transaction().unwrap();
    ldo.fields().set("name", "Not Joey").unwrap();
    ldo.rollback().unwrap();
    assert_eq!(ldo.fields().get_str("name").unwrap().as_deref(), Some("Joey"));
    assert!(parent.contains(&name_quad("Joey")));
}

#[test]
fn test_write_graph() {
    let parent = SharedDataset::new();
    let mut ldo = profile_ldo(&parent);
    let graph = NamedNode::new("https://graphname.com").unwrap();
    ldo.set_write_graph(graph.clone());
    ldo.fields().set("name", "Jackson").unwrap();
    assert_eq!(ldo.graph_of("name").unwrap(), vec![GraphName::from(graph)]);
    // named graphs cannot be written as plain triples
    assert!(ldo.to_ntriples().is_err());
    assert!(ldo
        .serialize(&SerializeOptions::new(OutputFormat::NQuads))
        .unwrap()
        .contains("<https://graphname.com>"));
}
