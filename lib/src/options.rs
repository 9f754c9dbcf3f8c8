//! Option types that replace boolean flag parameters in the Rust API.

/// How a new object picks its entry node from the fields it is created with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum EntryNodePolicy {
    /// Use the `@id` field when present and non-empty, else a fresh blank node.
    #[default]
    UseProvidedId,
    /// Always use a fresh blank node; an `@id` field is ignored.
    GenerateBlankNode,
}

impl EntryNodePolicy {
    pub fn uses_provided_id(self) -> bool {
        matches!(self, EntryNodePolicy::UseProvidedId)
    }
}

impl From<bool> for EntryNodePolicy {
    fn from(value: bool) -> Self {
        if value {
            EntryNodePolicy::UseProvidedId
        } else {
            EntryNodePolicy::GenerateBlankNode
        }
    }
}

/// Whether an object should be moved into a transaction once it is built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TransactionMode {
    /// Wrap the backing dataset in a fresh transaction.
    Transactional,
    /// Read and write the backing dataset directly.
    Direct,
}

impl TransactionMode {
    pub fn is_transactional(self) -> bool {
        matches!(self, TransactionMode::Transactional)
    }
}

impl From<bool> for TransactionMode {
    fn from(value: bool) -> Self {
        if value {
            TransactionMode::Transactional
        } else {
            TransactionMode::Direct
        }
    }
}
