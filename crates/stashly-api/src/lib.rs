//! Async REST transport for stashly entity collections.
//!
//! One [`RestClient`] talks to one remote resource: a single-entity URL
//! (`GET`/`PUT`/`DELETE {entity_url}{key}`, `POST {entity_url}`) and a
//! collection URL (`GET {collection_url}`, optionally with a query string).
//! Every failure carries the HTTP method and URL that produced it so the
//! cache engine can surface it as a typed data-service error.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ResourceUrls, RestClient};
pub use error::{Error, HttpMethod};
pub use transport::{TlsMode, TransportConfig};
