pub mod clock;
pub mod collection;
pub mod memstore;
pub mod persistence;

pub use collection::{CollectionRegistry, CollectionStore, Document};
pub use memstore::MemorySubstrate;
pub use persistence::FileSubstrate;
