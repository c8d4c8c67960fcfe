use log::{debug, error};
use serde_json::{Map, Value};

use crate::engine::clock::{self, Clock};
use crate::{Result, Substrate, PRODUCTS};

/// A stored record: a JSON object carrying an `id`, `createdAt` and `updatedAt`
/// next to its domain fields.
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// The set of collections a store knows about up front.
///
/// [`CollectionStore::initialize`] creates every registered collection. Names
/// outside the registry still work with the generic operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRegistry {
    names: Vec<String>,
}

impl CollectionRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self { names: Vec::new() };
        for name in names {
            let name = name.into();
            if !registry.names.contains(&name) {
                registry.names.push(name);
            }
        }
        registry
    }

    /// The storefront's collections.
    pub fn standard() -> Self {
        Self::new([PRODUCTS])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Generic document collections on top of a [`Substrate`].
///
/// Each collection is one JSON array under one substrate key, and every call
/// reads, modifies and writes back the whole array. There is no isolation
/// between concurrent callers: two interleaved writers can lose each other's
/// changes, so writers must be serialized by the caller.
#[derive(Debug)]
pub struct CollectionStore<S> {
    substrate: S,
    registry: CollectionRegistry,
    clock: Clock,
}

impl<S: Substrate> CollectionStore<S> {
    pub fn new(substrate: S, registry: CollectionRegistry) -> Self {
        Self {
            substrate,
            registry,
            clock: Clock::new(),
        }
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Ensures every registered collection exists.
    pub fn initialize(&self) -> Result<()> {
        for name in self.registry.names() {
            self.ensure_collection(name)?;
        }
        Ok(())
    }

    /// Writes an empty array at `name` if the substrate holds nothing there.
    pub fn ensure_collection(&self, name: &str) -> Result<()> {
        if self.substrate.read(name)?.is_none() {
            self.substrate.write(name, "[]")?;
        }
        Ok(())
    }

    /// Returns every document of the collection in insertion order.
    ///
    /// A stored value that does not decode as an array of objects is logged and
    /// treated as an empty collection.
    pub fn list_all(&self, name: &str) -> Result<Vec<Document>> {
        self.ensure_collection(name)?;
        let raw = match self.substrate.read(name)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        match serde_json::from_str::<Vec<Document>>(&raw) {
            Ok(docs) => Ok(docs),
            Err(e) => {
                error!("Could not unmarshal collection {}: {}", name, e);
                Ok(Vec::new())
            }
        }
    }

    pub fn get_by_id(&self, name: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .list_all(name)?
            .into_iter()
            .find(|doc| document_id(doc) == Some(id)))
    }

    /// Appends `document` with a fresh `id` and `createdAt == updatedAt`.
    ///
    /// Any `id`, `createdAt` or `updatedAt` already present on the input is
    /// overwritten.
    pub fn create(&self, name: &str, mut document: Document) -> Result<Document> {
        let mut docs = self.list_all(name)?;

        let millis = self.clock.tick();
        let mut rng = rand::thread_rng();
        let mut id = clock::generate_id(millis, &mut rng);
        while docs.iter().any(|doc| document_id(doc) == Some(id.as_str())) {
            id = clock::generate_id(millis, &mut rng);
        }
        let now = clock::format_timestamp(millis)?;

        document.insert(ID_FIELD.to_string(), Value::String(id));
        document.insert(CREATED_AT_FIELD.to_string(), Value::String(now.clone()));
        document.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));

        docs.push(document.clone());
        self.save(name, &docs)?;

        Ok(document)
    }

    /// Overlays `patch` on the stored document in place.
    ///
    /// `id` and `createdAt` keep their stored values whatever the patch says, and
    /// `updatedAt` moves strictly forward. Returns `None` without writing when no
    /// document has that id.
    pub fn update(&self, name: &str, id: &str, patch: Document) -> Result<Option<Document>> {
        let mut docs = self.list_all(name)?;
        let Some(existing) = docs.iter_mut().find(|doc| document_id(doc) == Some(id)) else {
            return Ok(None);
        };

        let floor = existing
            .get(UPDATED_AT_FIELD)
            .and_then(Value::as_str)
            .and_then(clock::parse_timestamp)
            .unwrap_or(i64::MIN);
        // The floor applies to this document only, never to the clock.
        let now = clock::format_timestamp(self.clock.tick().max(floor.saturating_add(1)))?;
        let created_at = existing.get(CREATED_AT_FIELD).cloned();

        for (key, value) in patch {
            existing.insert(key, value);
        }
        existing.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        match created_at {
            Some(created_at) => existing.insert(CREATED_AT_FIELD.to_string(), created_at),
            None => existing.remove(CREATED_AT_FIELD),
        };
        existing.insert(UPDATED_AT_FIELD.to_string(), Value::String(now));

        let merged = existing.clone();
        self.save(name, &docs)?;

        Ok(Some(merged))
    }

    /// Deletes the document with `id`. Returns whether anything was removed.
    pub fn remove(&self, name: &str, id: &str) -> Result<bool> {
        let mut docs = self.list_all(name)?;
        let before = docs.len();
        docs.retain(|doc| document_id(doc) != Some(id));

        if docs.len() == before {
            return Ok(false);
        }

        self.save(name, &docs)?;
        Ok(true)
    }

    /// Returns the documents whose fields equal every filter value.
    ///
    /// A document missing a filtered field never matches. Numbers compare by
    /// value, so `5` and `5.0` are equal; nothing else is coerced.
    pub fn query(&self, name: &str, filters: &Document) -> Result<Vec<Document>> {
        let docs = self.list_all(name)?;
        if filters.is_empty() {
            return Ok(docs);
        }
        Ok(docs
            .into_iter()
            .filter(|doc| matches_filters(doc, filters))
            .collect())
    }

    fn save(&self, name: &str, docs: &[Document]) -> Result<()> {
        let raw = serde_json::to_string(docs)?;
        self.substrate.write(name, &raw)?;
        debug!("Persisted collection {} ({} documents)", name, docs.len());
        Ok(())
    }
}

pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

pub fn matches_filters(doc: &Document, filters: &Document) -> bool {
    filters
        .iter()
        .all(|(key, expected)| doc.get(key).is_some_and(|actual| values_equal(actual, expected)))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}
