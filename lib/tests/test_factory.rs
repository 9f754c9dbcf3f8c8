use ldo::parse::parse_quads;
use ldo::{EntryNodePolicy, LdoFactory, ParseOptions, SharedDataset, ShapeDescriptor};
use oxigraph::io::RdfFormat;
use oxigraph::model::{NamedNode, NamedOrBlankNode};
use serde_json::{json, Map, Value};
use std::path::Path;

const CARD_BASE: &str = "https://solidweb.org/jackson/profile/card";
const ME: &str = "https://solidweb.org/jackson/profile/card#me";

fn factory() -> LdoFactory {
    LdoFactory::new(
        ShapeDescriptor::from_file(Path::new("fixtures/profile/profile_shape.json")).unwrap(),
    )
}

fn card() -> String {
    std::fs::read_to_string("fixtures/profile/card.ttl").unwrap()
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

#[test]
fn test_new_object() {
    let ldo = factory()
        .new_object(Some("https://example.com/person1".into()))
        .unwrap();
    ldo.fields().set("fn", "Diplo").unwrap();
    assert!(ldo.to_turtle().unwrap().contains(
        "<https://example.com/person1> <http://www.w3.org/2006/vcard/ns#fn> \"Diplo\""
    ));
    let changes = ldo.changes().unwrap();
    assert_eq!(changes.num_added(), 1);
}

#[test]
fn test_new_object_without_id_uses_blank_node() {
    let ldo = factory().new_object(None).unwrap();
    assert!(matches!(ldo.id(), NamedOrBlankNode::BlankNode(_)));
    assert!(ldo.dataset().is_empty());
}

#[test]
fn test_create_with_id() {
    let ldo = factory()
        .create(
            &as_map(json!({
                "@id": "https://example.com/person1",
                "type": [{"@id": "Person"}, {"@id": "Person2"}],
                "inbox": {"@id": "https://inbox.com"},
                "fn": "Diplo"
            })),
            EntryNodePolicy::UseProvidedId,
        )
        .unwrap();
    assert_eq!(
        ldo.id(),
        &NamedOrBlankNode::from(NamedNode::new("https://example.com/person1").unwrap())
    );
    let fields = ldo.fields();
    assert_eq!(fields.get_str("inbox").unwrap().as_deref(), Some("https://inbox.com"));
    assert_eq!(fields.get_str("fn").unwrap().as_deref(), Some("Diplo"));
    assert_eq!(fields.to_json()["type"], json!(["Person", "Person2"]));
    // the initial fields are part of the base data, not the diff
    assert!(ldo.changes().unwrap().is_empty());
    assert!(ldo.is_valid().unwrap());
}

#[test]
fn test_create_without_id() {
    let ldo = factory()
        .create(
            &as_map(json!({
                "type": [{"@id": "Person"}],
                "inbox": {"@id": "https://inbox.com"},
                "fn": "Diplo"
            })),
            EntryNodePolicy::UseProvidedId,
        )
        .unwrap();
    assert!(matches!(ldo.id(), NamedOrBlankNode::BlankNode(_)));
    assert_eq!(ldo.fields().get_str("fn").unwrap().as_deref(), Some("Diplo"));
}

#[test]
fn test_create_ignoring_id() {
    let ldo = factory()
        .create(
            &as_map(json!({"@id": "https://example.com/person1", "fn": "Diplo"})),
            EntryNodePolicy::GenerateBlankNode,
        )
        .unwrap();
    assert!(matches!(ldo.id(), NamedOrBlankNode::BlankNode(_)));
}

#[test]
fn test_parse_turtle_with_base() {
    let options = ParseOptions::default().with_base_iri(CARD_BASE);
    let ldo = factory().parse(ME, card(), &options).unwrap();
    assert_eq!(
        ldo.fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );
    assert_eq!(
        ldo.fields().get_str("inbox").unwrap().as_deref(),
        Some("https://solidweb.org/jackson/inbox/")
    );
    assert!(ldo.is_valid().unwrap());
}

#[test]
fn test_parse_with_named_node_entry() {
    let options = ParseOptions::default()
        .with_format(RdfFormat::Turtle)
        .with_base_iri(CARD_BASE);
    let ldo = factory()
        .parse(NamedNode::new(ME).unwrap(), card(), &options)
        .unwrap();
    assert_eq!(
        ldo.fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );
}

#[test]
fn test_parse_existing_dataset() {
    let dataset = SharedDataset::from_quads(
        parse_quads(
            r#"<https://example.com/item> <http://xmlns.com/foaf/0.1/name> "Captain cool" ."#,
            RdfFormat::NTriples,
            None,
        )
        .unwrap(),
    );
    let ldo = factory()
        .parse("https://example.com/item", dataset.clone(), &ParseOptions::default())
        .unwrap();
    assert_eq!(
        ldo.fields().get_str("name").unwrap().as_deref(),
        Some("Captain cool")
    );
    ldo.fields().set("name", "Captain cooler").unwrap();
    // the object works in a transaction over the given dataset
    assert!(dataset
        .quads()
        .iter()
        .any(|q| q.object.to_string() == "\"Captain cool\""));
}

#[test]
fn test_parse_json_ld_document() {
    let document: Value =
        serde_json::from_str(&std::fs::read_to_string("fixtures/profile/item.jsonld").unwrap())
            .unwrap();
    let ldo = factory()
        .parse("https://example.com/item", document, &ParseOptions::default())
        .unwrap();
    assert_eq!(
        ldo.fields().get_str("name").unwrap().as_deref(),
        Some("Mr. Cool Dude")
    );
}

#[test]
fn test_parse_malformed_input() {
    let err = factory()
        .parse(
            "https://example.com/item",
            "this is not turtle",
            &ParseOptions::default(),
        )
        .unwrap_err();
    assert!(!err.to_string().is_empty());
}
