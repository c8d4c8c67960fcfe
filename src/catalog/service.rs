use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::product::{validate_product, Product, ProductPatch};
use crate::engine::{CollectionRegistry, CollectionStore, Document};
use crate::{Result, Substrate, PRODUCTS};

pub const DEFAULT_FEATURED_LIMIT: usize = 6;

/// Filters for [`ProductService::search_products`]. Every supplied filter must match.
///
/// On the wire this is a flat object: `searchText`, `minPrice`, `maxPrice` and
/// `inStock` are predicates, any other key is an exact-match field filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the name or the description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    /// Inclusive lower price bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Keep only products with `stock > 0`.
    pub in_stock: bool,
    #[serde(flatten)]
    pub filters: Document,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn in_stock(mut self) -> Self {
        self.in_stock = true;
        self
    }

    /// True when only exact-match field filters are set.
    pub fn is_equality_only(&self) -> bool {
        self.search_text.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && !self.in_stock
    }

    fn matches(&self, product: &Product) -> bool {
        if let Some(text) = &self.search_text {
            let needle = text.to_lowercase();
            if !product.name.to_lowercase().contains(&needle)
                && !product.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        !(self.in_stock && product.stock <= 0)
    }
}

/// The entry point application code uses for products.
///
/// Wraps a [`CollectionStore`] with the product collection bound and validates
/// every write against the full resulting product.
#[derive(Debug)]
pub struct ProductService<S> {
    store: CollectionStore<S>,
}

impl<S: Substrate> ProductService<S> {
    pub fn new(store: CollectionStore<S>) -> Self {
        Self { store }
    }

    /// Builds a service over `substrate` with the standard collections initialized.
    pub fn open(substrate: S) -> Result<Self> {
        let store = CollectionStore::new(substrate, CollectionRegistry::standard());
        store.initialize()?;
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    pub fn get_all_products(&self) -> Result<Vec<Product>> {
        Ok(decode_all(self.store.list_all(PRODUCTS)?))
    }

    pub fn get_product_by_id(&self, id: &str) -> Result<Option<Product>> {
        self.store
            .get_by_id(PRODUCTS, id)?
            .map(Product::from_document)
            .transpose()
    }

    /// Validates `product` and stores it with a fresh id and timestamps.
    pub fn create_product(&self, product: &Product) -> Result<Product> {
        validate_product(product).into_result()?;
        let created = self.store.create(PRODUCTS, product.to_document()?)?;
        Product::from_document(created)
    }

    /// Applies `patch` to the stored product.
    ///
    /// The patch is validated merged onto the current product, so a patch that
    /// leaves the product invalid is rejected even if its own fields are fine.
    /// Returns `Ok(None)` when no product has that id.
    pub fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<Option<Product>> {
        let Some(existing) = self.get_product_by_id(id)? else {
            return Ok(None);
        };

        validate_product(&patch.apply(&existing)).into_result()?;

        self.store
            .update(PRODUCTS, id, patch.to_document()?)?
            .map(Product::from_document)
            .transpose()
    }

    pub fn delete_product(&self, id: &str) -> Result<bool> {
        self.store.remove(PRODUCTS, id)
    }

    pub fn search_products(&self, criteria: &SearchCriteria) -> Result<Vec<Product>> {
        let docs = self.store.query(PRODUCTS, &criteria.filters)?;
        let products = decode_all(docs);
        if criteria.is_equality_only() {
            return Ok(products);
        }
        Ok(products
            .into_iter()
            .filter(|product| criteria.matches(product))
            .collect())
    }

    /// Up to `limit` featured products in insertion order.
    pub fn get_featured_products(&self, limit: usize) -> Result<Vec<Product>> {
        let mut filters = Document::new();
        filters.insert("featured".to_string(), Value::Bool(true));
        let mut featured = decode_all(self.store.query(PRODUCTS, &filters)?);
        featured.truncate(limit);
        Ok(featured)
    }
}

fn decode_all(docs: Vec<Document>) -> Vec<Product> {
    docs.into_iter()
        .filter_map(|doc| match Product::from_document(doc) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!("Skipping malformed product document: {}", e);
                None
            }
        })
        .collect()
}
