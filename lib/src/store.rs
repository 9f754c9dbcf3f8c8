//! Quad stores backing linked data objects.
//!
//! `SharedDataset` is a cheaply clonable handle to one in-memory dataset. It can
//! start a `Transaction`, a copy-on-write overlay that records added and removed
//! quads without touching the parent until it is committed. `GraphStore` is the
//! sum of the three kinds of backing store an object can have.
//!
//! Everything here is single-threaded: handles share state through
//! `Rc<RefCell<_>>` and there is no locking.

use crate::errors::LdoError;
use anyhow::{Error, Result};
use log::debug;
use oxigraph::model::{
    Dataset, GraphNameRef, NamedNodeRef, NamedOrBlankNodeRef, Quad, QuadRef, TermRef,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Matches a quad against an optional (subject, predicate, object, graph) pattern.
fn matches_pattern(
    quad: QuadRef<'_>,
    subject: Option<NamedOrBlankNodeRef<'_>>,
    predicate: Option<NamedNodeRef<'_>>,
    object: Option<TermRef<'_>>,
    graph_name: Option<GraphNameRef<'_>>,
) -> bool {
    subject.map_or(true, |s| quad.subject == s)
        && predicate.map_or(true, |p| quad.predicate == p)
        && object.map_or(true, |o| quad.object == o)
        && graph_name.map_or(true, |g| quad.graph_name == g)
}

/// Collects owned quads into a dataset.
pub fn dataset_from_quads(quads: impl IntoIterator<Item = Quad>) -> Dataset {
    let mut dataset = Dataset::new();
    for quad in quads {
        dataset.insert(&quad);
    }
    dataset
}

/// A shared, mutable in-memory dataset that can start transactions.
#[derive(Debug, Clone, Default)]
pub struct SharedDataset {
    inner: Rc<RefCell<Dataset>>,
}

impl SharedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing dataset without copying it.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            inner: Rc::new(RefCell::new(dataset)),
        }
    }

    pub fn from_quads(quads: impl IntoIterator<Item = Quad>) -> Self {
        Self::from_dataset(dataset_from_quads(quads))
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.inner.borrow_mut().insert(quad)
    }

    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.inner.borrow_mut().remove(quad)
    }

    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.inner.borrow().contains(quad)
    }

    /// Adds every quad of the iterator to the dataset.
    pub fn add_all(&self, quads: impl IntoIterator<Item = Quad>) {
        let mut dataset = self.inner.borrow_mut();
        for quad in quads {
            dataset.insert(&quad);
        }
    }

    /// Snapshot of the quads currently in the dataset.
    pub fn quads(&self) -> Vec<Quad> {
        self.inner.borrow().iter().map(QuadRef::into_owned).collect()
    }

    pub fn quads_for_pattern(
        &self,
        subject: Option<NamedOrBlankNodeRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Vec<Quad> {
        self.inner
            .borrow()
            .iter()
            .filter(|q| matches_pattern(*q, subject, predicate, object, graph_name))
            .map(QuadRef::into_owned)
            .collect()
    }

    /// An independent copy of the current content.
    pub fn to_dataset(&self) -> Dataset {
        self.inner.borrow().clone()
    }

    /// Returns true if both handles point at the same dataset.
    pub fn ptr_eq(&self, other: &SharedDataset) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn start_transaction(&self) -> Transaction {
        debug!("Starting transaction over dataset with {} quads", self.len());
        Transaction {
            parent: self.clone(),
            overlay: Rc::new(RefCell::new(Overlay::default())),
        }
    }
}

impl From<Dataset> for SharedDataset {
    fn from(dataset: Dataset) -> Self {
        SharedDataset::from_dataset(dataset)
    }
}

/// The difference between a transaction and its parent.
///
/// `added` and `removed` are disjoint and never hold an empty dataset: a kind
/// of change that did not happen is `None`.
#[derive(Debug, Clone, Default)]
pub struct DatasetChanges {
    pub added: Option<Dataset>,
    pub removed: Option<Dataset>,
}

impl DatasetChanges {
    pub fn new(added: Dataset, removed: Dataset) -> Self {
        Self {
            added: (!added.is_empty()).then_some(added),
            removed: (!removed.is_empty()).then_some(removed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_none() && self.removed.is_none()
    }

    pub fn num_added(&self) -> usize {
        self.added.as_ref().map_or(0, Dataset::len)
    }

    pub fn num_removed(&self) -> usize {
        self.removed.as_ref().map_or(0, Dataset::len)
    }
}

#[derive(Debug, Default)]
struct Overlay {
    added: Dataset,
    removed: Dataset,
}

/// A copy-on-write overlay over a parent `SharedDataset`.
///
/// Visible content is `parent - removed + added`, evaluated on every read.
/// Clones share the same overlay.
#[derive(Debug, Clone)]
pub struct Transaction {
    parent: SharedDataset,
    overlay: Rc<RefCell<Overlay>>,
}

impl Transaction {
    pub fn parent(&self) -> &SharedDataset {
        &self.parent
    }

    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        let quad = quad.into();
        let mut overlay = self.overlay.borrow_mut();
        if overlay.removed.remove(quad) {
            return true;
        }
        if self.parent.contains(quad) {
            return false;
        }
        overlay.added.insert(quad)
    }

    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        let quad = quad.into();
        let mut overlay = self.overlay.borrow_mut();
        if overlay.added.remove(quad) {
            return true;
        }
        if self.parent.contains(quad) {
            return overlay.removed.insert(quad);
        }
        false
    }

    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        let quad = quad.into();
        let overlay = self.overlay.borrow();
        overlay.added.contains(quad)
            || (self.parent.contains(quad) && !overlay.removed.contains(quad))
    }

    /// Snapshot of the visible quads.
    pub fn quads(&self) -> Vec<Quad> {
        let overlay = self.overlay.borrow();
        let mut quads: Vec<Quad> = self
            .parent
            .quads()
            .into_iter()
            .filter(|q| !overlay.removed.contains(q))
            .collect();
        quads.extend(
            overlay
                .added
                .iter()
                .filter(|q| !self.parent.contains(*q))
                .map(QuadRef::into_owned),
        );
        quads
    }

    pub fn len(&self) -> usize {
        self.quads().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes the delta between the visible content and the parent right now.
    pub fn changes(&self) -> DatasetChanges {
        let overlay = self.overlay.borrow();
        let added = dataset_from_quads(
            overlay
                .added
                .iter()
                .filter(|q| !self.parent.contains(*q))
                .map(QuadRef::into_owned),
        );
        let removed = dataset_from_quads(
            overlay
                .removed
                .iter()
                .filter(|q| self.parent.contains(*q))
                .map(QuadRef::into_owned),
        );
        DatasetChanges::new(added, removed)
    }

    /// Merges the overlay into the parent and clears it.
    pub fn commit(&self) {
        let changes = self.changes();
        debug!(
            "Committing transaction: {} added, {} removed",
            changes.num_added(),
            changes.num_removed()
        );
        if let Some(removed) = &changes.removed {
            for quad in removed.iter() {
                self.parent.remove(quad);
            }
        }
        if let Some(added) = &changes.added {
            for quad in added.iter() {
                self.parent.insert(quad);
            }
        }
        *self.overlay.borrow_mut() = Overlay::default();
    }

    /// Drops the overlay, leaving the parent untouched.
    pub fn rollback(&self) {
        debug!("Rolling back transaction");
        *self.overlay.borrow_mut() = Overlay::default();
    }
}

/// The store a linked data object reads from and writes to.
#[derive(Debug, Clone)]
pub enum GraphStore {
    /// A dataset without transaction support
    Plain(SharedDataset),
    /// A dataset that can start transactions
    Subscribable(SharedDataset),
    Transaction(Transaction),
}

impl GraphStore {
    pub fn insert<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.insert(quad),
            GraphStore::Transaction(t) => t.insert(quad),
        }
    }

    pub fn remove<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.remove(quad),
            GraphStore::Transaction(t) => t.remove(quad),
        }
    }

    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.contains(quad),
            GraphStore::Transaction(t) => t.contains(quad),
        }
    }

    pub fn quads(&self) -> Vec<Quad> {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.quads(),
            GraphStore::Transaction(t) => t.quads(),
        }
    }

    pub fn quads_for_pattern(
        &self,
        subject: Option<NamedOrBlankNodeRef<'_>>,
        predicate: Option<NamedNodeRef<'_>>,
        object: Option<TermRef<'_>>,
        graph_name: Option<GraphNameRef<'_>>,
    ) -> Vec<Quad> {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => {
                d.quads_for_pattern(subject, predicate, object, graph_name)
            }
            GraphStore::Transaction(t) => t
                .quads()
                .into_iter()
                .filter(|q| matches_pattern(q.as_ref(), subject, predicate, object, graph_name))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.len(),
            GraphStore::Transaction(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An independent copy of the visible quads.
    pub fn to_dataset(&self) -> Dataset {
        match self {
            GraphStore::Plain(d) | GraphStore::Subscribable(d) => d.to_dataset(),
            GraphStore::Transaction(t) => dataset_from_quads(t.quads()),
        }
    }

    pub fn can_start_transaction(&self) -> bool {
        matches!(self, GraphStore::Subscribable(_))
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, GraphStore::Transaction(_))
    }

    pub fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            GraphStore::Transaction(t) => Some(t),
            _ => None,
        }
    }

    pub fn start_transaction(&self) -> Result<Transaction> {
        match self {
            GraphStore::Subscribable(d) => Ok(d.start_transaction()),
            GraphStore::Plain(_) => Err(Error::new(LdoError::NotTransactable)),
            GraphStore::Transaction(_) => Err(Error::new(LdoError::AlreadyInTransaction)),
        }
    }
}

impl From<SharedDataset> for GraphStore {
    fn from(dataset: SharedDataset) -> Self {
        GraphStore::Subscribable(dataset)
    }
}

impl From<Transaction> for GraphStore {
    fn from(transaction: Transaction) -> Self {
        GraphStore::Transaction(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{GraphName, Literal, NamedNode};

    fn name_quad(value: &str) -> Quad {
        Quad::new(
            NamedNode::new_unchecked("https://example.com/item"),
            NamedNode::new_unchecked("http://xmlns.com/foaf/0.1/name"),
            Literal::new_simple_literal(value),
            GraphName::DefaultGraph,
        )
    }

    #[test]
    fn test_fresh_transaction_has_no_changes() {
        let dataset = SharedDataset::from_quads([name_quad("a")]);
        let tx = dataset.start_transaction();
        let changes = tx.changes();
        assert!(changes.added.is_none());
        assert!(changes.removed.is_none());
        assert_eq!(tx.len(), 1);
    }

    #[test]
    fn test_transaction_overlay_is_isolated() {
        let dataset = SharedDataset::from_quads([name_quad("a")]);
        let tx = dataset.start_transaction();
        assert!(tx.remove(&name_quad("a")));
        assert!(tx.insert(&name_quad("b")));
        assert!(!tx.contains(&name_quad("a")));
        assert!(tx.contains(&name_quad("b")));
        assert!(dataset.contains(&name_quad("a")));
        assert_eq!(dataset.len(), 1);

        let changes = tx.changes();
        assert_eq!(changes.num_added(), 1);
        assert_eq!(changes.num_removed(), 1);
    }

    #[test]
    fn test_insert_then_remove_cancels_out() {
        let dataset = SharedDataset::new();
        let tx = dataset.start_transaction();
        tx.insert(&name_quad("a"));
        tx.remove(&name_quad("a"));
        assert!(tx.changes().is_empty());
    }

    #[test]
    fn test_remove_then_reinsert_cancels_out() {
        let dataset = SharedDataset::from_quads([name_quad("a")]);
        let tx = dataset.start_transaction();
        tx.remove(&name_quad("a"));
        tx.insert(&name_quad("a"));
        assert!(tx.changes().is_empty());
        assert!(tx.contains(&name_quad("a")));
    }

    #[test]
    fn test_commit_merges_into_parent() {
        let dataset = SharedDataset::from_quads([name_quad("a")]);
        let tx = dataset.start_transaction();
        tx.remove(&name_quad("a"));
        tx.insert(&name_quad("b"));
        tx.commit();
        assert!(dataset.contains(&name_quad("b")));
        assert!(!dataset.contains(&name_quad("a")));
        assert!(tx.changes().is_empty());
    }

    #[test]
    fn test_rollback_leaves_parent() {
        let dataset = SharedDataset::new();
        let tx = dataset.start_transaction();
        tx.insert(&name_quad("a"));
        tx.rollback();
        assert!(dataset.is_empty());
        assert!(tx.is_empty());
    }

    #[test]
    fn test_plain_store_is_not_transactable() {
        let store = GraphStore::Plain(SharedDataset::new());
        assert!(!store.can_start_transaction());
        let err = store.start_transaction().unwrap_err();
        assert_eq!(err.to_string(), "Object is not transactable.");
    }

    #[test]
    fn test_pattern_match_on_transaction() {
        let dataset = SharedDataset::from_quads([name_quad("a")]);
        let store = GraphStore::Transaction(dataset.start_transaction());
        store.insert(&name_quad("b"));
        let name = NamedNode::new_unchecked("http://xmlns.com/foaf/0.1/name");
        let found = store.quads_for_pattern(None, Some(name.as_ref()), None, None);
        assert_eq!(found.len(), 2);
    }
}
