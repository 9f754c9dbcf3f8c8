//! Renders a dataset diff as one line of SPARQL Update.

use crate::convert::{quads_to_string, OutputFormat, SerializeOptions};
use crate::store::DatasetChanges;
use anyhow::Result;
use oxigraph::model::{Dataset, GraphNameRef, QuadRef};
use std::collections::BTreeMap;

/// Renders the quads of a dataset as the body of a `DATA` block: default-graph
/// triples first, then one `GRAPH <g> { ... }` block per named graph.
fn data_block(dataset: &Dataset) -> Result<String> {
    let triples = SerializeOptions::new(OutputFormat::NTriples);
    let default_graph = quads_to_string(
        dataset
            .iter()
            .filter(|q| q.graph_name.is_default_graph())
            .map(|q| QuadRef::new(q.subject, q.predicate, q.object, GraphNameRef::DefaultGraph)),
        &triples,
    )?;

    let mut named: BTreeMap<String, Vec<QuadRef<'_>>> = BTreeMap::new();
    for quad in dataset.iter().filter(|q| !q.graph_name.is_default_graph()) {
        named.entry(quad.graph_name.to_string()).or_default().push(QuadRef::new(
            quad.subject,
            quad.predicate,
            quad.object,
            GraphNameRef::DefaultGraph,
        ));
    }
    let mut block = default_graph;
    for (graph, quads) in named {
        let body = quads_to_string(quads, &triples)?;
        block.push_str(&format!("GRAPH {} {{ {} }} ", graph, body));
    }
    Ok(block.replace('\n', " "))
}

/// `DELETE DATA { ... }; INSERT DATA { ... }`, omitting clauses with nothing to
/// say; an empty diff renders as the empty string.
pub fn changes_to_sparql_update(changes: &DatasetChanges) -> Result<String> {
    let mut statements = vec![];
    if let Some(removed) = &changes.removed {
        statements.push(format!("DELETE DATA {{ {} }}", data_block(removed)?));
    }
    if let Some(added) = &changes.added {
        statements.push(format!("INSERT DATA {{ {} }}", data_block(added)?));
    }
    Ok(statements.join("; "))
}
