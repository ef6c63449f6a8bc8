use mongodb::error::{Error, ErrorKind};
use thiserror::Error;

/// Server error code raised by `create` when the namespace already exists.
pub const NAMESPACE_EXISTS: i32 = 48;

/// The single tolerated failure class: creating a collection that is already
/// there. Everything else is fatal and propagates.
pub fn is_collection_exists(err: &Error) -> bool {
    matches!(*err.kind, ErrorKind::Command(ref command) if command.code == NAMESPACE_EXISTS)
}

/// Boundary validation failures, raised before a document is handed to the
/// store. Always fatal.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("collection {collection}: missing required field '{field}'")]
    MissingField {
        collection: &'static str,
        field: &'static str,
    },

    #[error("collection {collection}: field '{field}' must be a {expected}")]
    WrongType {
        collection: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("collection {collection}: field '{field}' must be one of {allowed:?}, got '{value}'")]
    InvalidEnumValue {
        collection: &'static str,
        field: &'static str,
        allowed: &'static [&'static str],
        value: String,
    },

    #[error("collection {collection}: field '{field}' must be >= {min}, got {value}")]
    BelowMinimum {
        collection: &'static str,
        field: &'static str,
        min: i64,
        value: i64,
    },

    #[error("collection {collection}: field '{field}' must not be empty")]
    EmptyArray {
        collection: &'static str,
        field: &'static str,
    },
}

/// Seed-plan failures. Always fatal; the whole seed aborts.
#[derive(Error, Debug, PartialEq)]
pub enum SeedError {
    #[error("seed data contains no authors")]
    NoAuthors,

    #[error("book '{title}' references unknown author alias '{alias}'")]
    UnknownAuthorAlias { title: String, alias: String },

    #[error("store returned no generated identifier for author at position {index}")]
    MissingInsertedId { index: usize },
}
