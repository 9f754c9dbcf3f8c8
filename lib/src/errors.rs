// Errors raised by linked data objects and their stores

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdoError {
    /// A transaction-scoped operation was called on an object outside a transaction
    NotInTransaction,
    /// The backing store cannot start transactions
    NotTransactable,
    /// `start_transaction` was called twice without commit or rollback
    AlreadyInTransaction,
    /// The field name is not defined in the shape's context
    UnknownField(String),
    /// The schema has no shape with this label
    ShapeNotFound(String),
    /// A JSON value could not be mapped onto RDF terms for a field
    InvalidFieldValue { field: String, reason: String },
}

impl fmt::Display for LdoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LdoError::NotInTransaction => write!(f, "Object is not currently in a transaction"),
            LdoError::NotTransactable => write!(f, "Object is not transactable."),
            LdoError::AlreadyInTransaction => write!(f, "Object is already in a transaction"),
            LdoError::UnknownField(field) => {
                write!(f, "Field '{}' is not defined in the context", field)
            }
            LdoError::ShapeNotFound(shape) => write!(f, "Shape <{}> not found in schema", shape),
            LdoError::InvalidFieldValue { field, reason } => {
                write!(f, "Invalid value for field '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for LdoError {}

/// Returns the `LdoError` at the root of an `anyhow` error, if there is one.
pub fn ldo_error(err: &anyhow::Error) -> Option<&LdoError> {
    err.downcast_ref::<LdoError>()
}
