use ldo::store::dataset_from_quads;
use ldo::util::read_file;
use ldo::{create_ldo_dataset, parse_rdf, LdoDataset, ParseOptions, ShapeDescriptor, TransactionMode};
use oxigraph::model::vocab::rdf;
use oxigraph::model::{GraphName, NamedNode, NamedOrBlankNode, Term};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;

const CARD_BASE: &str = "https://solidweb.org/jackson/profile/card";
const ME: &str = "https://solidweb.org/jackson/profile/card#me";

fn profile_shape() -> Arc<ShapeDescriptor> {
    let _ = env_logger::builder().is_test(true).try_init();
    ShapeDescriptor::from_file(Path::new("fixtures/profile/profile_shape.json")).unwrap()
}

fn card_dataset() -> LdoDataset {
    let quads = read_file(Path::new("fixtures/profile/card.ttl"), Some(CARD_BASE)).unwrap();
    create_ldo_dataset(quads).unwrap()
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

#[test]
fn test_create_from_dataset_and_quads() {
    let quads = read_file(Path::new("fixtures/profile/card.ttl"), Some(CARD_BASE)).unwrap();
    assert_eq!(quads.len(), 8);
    let from_dataset = create_ldo_dataset(dataset_from_quads(quads.clone())).unwrap();
    let from_quads = create_ldo_dataset(quads).unwrap();
    assert_eq!(from_dataset.len(), 8);
    assert_eq!(from_quads.len(), 8);
    assert!(LdoDataset::new().is_empty());
}

#[test]
fn test_parse_rdf() {
    let text = std::fs::read_to_string("fixtures/profile/card.ttl").unwrap();
    let dataset = parse_rdf(text, &ParseOptions::default().with_base_iri(CARD_BASE)).unwrap();
    assert_eq!(dataset.len(), 8);
}

#[test]
fn test_from_json_with_id() {
    let dataset = LdoDataset::new();
    let ldo = dataset
        .using_shape(profile_shape())
        .from_json(&as_map(json!({
            "@id": "https://example.com/person1",
            "fn": "Cool Dude"
        })))
        .unwrap();
    assert_eq!(
        ldo.id(),
        &NamedOrBlankNode::from(NamedNode::new("https://example.com/person1").unwrap())
    );
    assert_eq!(ldo.fields().get_str("fn").unwrap().as_deref(), Some("Cool Dude"));
    // objects write straight into the dataset by default
    assert_eq!(dataset.len(), 1);
}

#[test]
fn test_from_json_without_id() {
    let dataset = LdoDataset::new();
    let ldo = dataset
        .using_shape(profile_shape())
        .from_json(&as_map(json!({"fn": "Cool Dude"})))
        .unwrap();
    assert!(matches!(ldo.id(), NamedOrBlankNode::BlankNode(_)));
    assert_eq!(ldo.fields().get_str("fn").unwrap().as_deref(), Some("Cool Dude"));
}

#[test]
fn test_from_subject() {
    let dataset = card_dataset();
    let ldo = dataset.using_shape(profile_shape()).from_subject(ME).unwrap();
    assert_eq!(
        ldo.fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );
    assert_eq!(
        ldo.fields().get_str("knows").unwrap().as_deref(),
        Some("https://example.com/friend#me")
    );
    assert!(!ldo.is_in_transaction());
}

#[test]
fn test_transactional_builder() {
    let dataset = card_dataset();
    let ldo = dataset
        .using_shape(profile_shape())
        .transaction_mode(TransactionMode::Transactional)
        .from_subject(ME)
        .unwrap();
    assert!(ldo.is_in_transaction());
    ldo.fields().set("fn", "Jack").unwrap();
    assert_eq!(ldo.changes().unwrap().num_added(), 1);
    assert_eq!(ldo.changes().unwrap().num_removed(), 1);
    // the dataset is untouched until commit
    let fresh = dataset.using_shape(profile_shape()).from_subject(ME).unwrap();
    assert_eq!(
        fresh.fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );
}

#[test]
fn test_builder_write_graph() {
    let dataset = LdoDataset::new();
    let graph = NamedNode::new("https://graphname.com").unwrap();
    let ldo = dataset
        .using_shape(profile_shape())
        .write_graph(graph.clone())
        .from_json(&as_map(json!({"@id": "https://example.com/person1", "fn": "Jackson"})))
        .unwrap();
    assert_eq!(ldo.write_graph(), &GraphName::from(graph.clone()));
    assert_eq!(ldo.graph_of("fn").unwrap(), vec![GraphName::from(graph)]);
}

#[test]
fn test_match_subject() {
    let dataset = card_dataset();
    let foaf_person = NamedNode::new("http://xmlns.com/foaf/0.1/Person").unwrap();
    let matches = dataset.using_shape(profile_shape()).match_subject(
        Some(rdf::TYPE),
        Some(Term::from(foaf_person.clone()).as_ref()),
        None,
    );
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );

    let some_graph = NamedNode::new("https://someGraph.com").unwrap();
    let none = dataset.using_shape(profile_shape()).match_subject(
        Some(rdf::TYPE),
        Some(Term::from(foaf_person).as_ref()),
        Some(some_graph.as_ref().into()),
    );
    assert!(none.is_empty());
}

#[test]
fn test_match_object() {
    let dataset = card_dataset();
    let primary_topic = NamedNode::new("http://xmlns.com/foaf/0.1/primaryTopic").unwrap();
    let matches = dataset
        .using_shape(profile_shape())
        .match_object(None, Some(primary_topic.as_ref()), None);
    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].fields().get_str("fn").unwrap().as_deref(),
        Some("Jackson Morgan")
    );

    let some_subject = NamedNode::new("https://someSubject.com").unwrap();
    let some_graph = NamedNode::new("https://someGraph.com").unwrap();
    let none = dataset.using_shape(profile_shape()).match_object(
        Some(some_subject.as_ref().into()),
        Some(primary_topic.as_ref()),
        Some(some_graph.as_ref().into()),
    );
    assert!(none.is_empty());
}

#[test]
fn test_match_object_skips_literals() {
    let dataset = card_dataset();
    let vcard_fn = NamedNode::new("http://www.w3.org/2006/vcard/ns#fn").unwrap();
    let matches = dataset
        .using_shape(profile_shape())
        .match_object(None, Some(vcard_fn.as_ref()), None);
    assert!(matches.is_empty());
}
