//! OpenSearch implementation of the search connection.
//!
//! This module provides a concrete implementation of `SearchConnection`
//! using the `opensearch` crate transport.

mod connection;

pub use connection::OpenSearchConnection;
