//! Army Store is the embedded document store behind the Army storefront catalog.
//!
//! It emulates a minimal document database (collections, generated IDs, timestamps,
//! equality queries) on top of a synchronous string-keyed storage [`Substrate`].
//! Each collection is persisted as one JSON array under one substrate key, and every
//! operation is a complete read-modify-write of that array.
//!
//! ## Core Components
//! - [`engine`]: Substrates (in-memory and atomic on-disk) and the generic [`engine::CollectionStore`].
//! - [`catalog`]: The Product domain layer, the [`catalog::ProductService`] facade and the seed generator.
//! - [`server`]: TCP daemon exposing the Product Service over a line protocol.

pub mod catalog;
pub mod engine;
pub mod server;

use thiserror::Error;

use crate::catalog::ValidationErrors;

/// Errors returned by the Army Store.
#[derive(Error, Debug)]
pub enum Error {
    /// A product write was rejected because the resulting document is invalid.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// A collection name cannot be used as a substrate key.
    #[error("invalid collection key: {0}")]
    InvalidKey(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred in the substrate or on the network.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for Army Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Substrate key of the product collection.
pub const PRODUCTS: &str = "army_products";

/// The synchronous string-keyed storage primitive collections are persisted in.
///
/// Implementations must be durable for at least the lifetime of the process.
/// Failures are returned as-is to the caller; the store never retries them.
pub trait Substrate: Send + Sync {
    /// Returns the value stored at `key`, or `None` if nothing was ever written there.
    fn read(&self, key: &str) -> Result<Option<String>>;
    /// Replaces the value stored at `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: Substrate + ?Sized> Substrate for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}
