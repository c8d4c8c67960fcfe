use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::vocabulary::DEFAULT_CATEGORY;
use crate::engine::Document;
use crate::{Error, Result};

pub const NAME_REQUIRED: &str = "El nombre es obligatorio";
pub const PRICE_NOT_POSITIVE: &str = "El precio debe ser mayor que cero";
pub const STOCK_NEGATIVE: &str = "El stock no puede ser negativo";

/// Color, size and material options a product is offered in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variations {
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub materials: Vec<String>,
}

/// A catalog product as stored in the `army_products` collection.
///
/// Missing fields take their [`Product::default`] value when read, so documents
/// written by older versions still load. `image` is the attachment descriptor
/// returned by the image host and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub variations: Variations,
    pub image: Option<Value>,
    pub active: bool,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for Product {
    fn default() -> Self {
        default_product()
    }
}

/// The blank product the admin form starts from.
pub fn default_product() -> Product {
    Product {
        id: String::new(),
        name: String::new(),
        description: String::new(),
        price: 0.0,
        stock: 0,
        category: DEFAULT_CATEGORY.to_string(),
        variations: Variations::default(),
        image: None,
        active: true,
        featured: false,
        created_at: None,
        updated_at: None,
    }
}

impl Product {
    pub fn has_image(&self) -> bool {
        self.image.as_ref().is_some_and(|image| !image.is_null())
    }

    pub fn to_document(&self) -> Result<Document> {
        into_document(serde_json::to_value(self)?)
    }

    pub fn from_document(document: Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// A partial update to a [`Product`].
///
/// Only fields that are `Some` are applied. `image: Some(None)` clears the
/// attachment. Identity and timestamps are not patchable, and unknown fields are
/// rejected when a patch is parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<Variations>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<Option<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

// A field that is present, even as `null`, is `Some`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `base` with every field set in this patch overridden.
    pub fn apply(&self, base: &Product) -> Product {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(price) = self.price {
            merged.price = price;
        }
        if let Some(stock) = self.stock {
            merged.stock = stock;
        }
        if let Some(category) = &self.category {
            merged.category = category.clone();
        }
        if let Some(variations) = &self.variations {
            merged.variations = variations.clone();
        }
        if let Some(image) = &self.image {
            merged.image = image.clone();
        }
        if let Some(active) = self.active {
            merged.active = active;
        }
        if let Some(featured) = self.featured {
            merged.featured = featured;
        }
        merged
    }

    pub fn to_document(&self) -> Result<Document> {
        into_document(serde_json::to_value(self)?)
    }
}

fn into_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Internal("expected a JSON object".to_string())),
    }
}

/// Field name to message map produced by [`validate_product`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    /// `Ok(())` when valid, otherwise [`Error::Validation`] carrying these errors.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Checks the rules a product must satisfy before it is written.
///
/// Category and variation values are not checked against the vocabularies.
pub fn validate_product(product: &Product) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if product.name.is_empty() {
        errors.insert("name", NAME_REQUIRED);
    }
    // NaN fails this comparison too.
    if !(product.price > 0.0) {
        errors.insert("price", PRICE_NOT_POSITIVE);
    }
    if product.stock < 0 {
        errors.insert("stock", STOCK_NEGATIVE);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boots() -> Product {
        Product {
            name: "Botas".to_string(),
            price: 100000.0,
            stock: 5,
            ..default_product()
        }
    }

    #[test]
    fn test_default_product_shape() {
        let product = default_product();
        assert_eq!(product.id, "");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.stock, 0);
        assert_eq!(product.category, "tactical");
        assert_eq!(product.variations, Variations::default());
        assert!(product.image.is_none());
        assert!(product.active);
        assert!(!product.featured);
    }

    #[test]
    fn test_default_product_instances_are_independent() {
        let mut a = default_product();
        a.variations.colors.push("Negro".to_string());
        assert!(default_product().variations.colors.is_empty());
    }

    #[test]
    fn test_validate_blank_product() {
        let errors = validate_product(&default_product());
        assert!(!errors.is_valid());
        assert_eq!(errors.get("name"), Some(NAME_REQUIRED));
        assert_eq!(errors.get("price"), Some(PRICE_NOT_POSITIVE));
        assert_eq!(errors.get("stock"), None);
    }

    #[test]
    fn test_validate_rules() {
        assert!(validate_product(&boots()).is_valid());

        let negative = Product { stock: -1, ..boots() };
        assert_eq!(
            validate_product(&negative).fields().collect::<Vec<_>>(),
            vec!["stock"]
        );

        let nan = Product { price: f64::NAN, ..boots() };
        assert_eq!(validate_product(&nan).get("price"), Some(PRICE_NOT_POSITIVE));

        let free_stock = Product { stock: 0, ..boots() };
        assert!(validate_product(&free_stock).is_valid());
    }

    #[test]
    fn test_unknown_category_is_accepted() {
        let product = Product {
            category: "drones".to_string(),
            ..boots()
        };
        assert!(validate_product(&product).is_valid());
    }

    #[test]
    fn test_validation_display_and_result() {
        let errors = validate_product(&default_product());
        assert_eq!(
            errors.to_string(),
            format!("name: {}, price: {}", NAME_REQUIRED, PRICE_NOT_POSITIVE)
        );
        assert!(matches!(errors.into_result(), Err(Error::Validation(_))));
        assert!(validate_product(&boots()).into_result().is_ok());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let mut product = boots();
        product.created_at = Some("2026-10-18T00:00:00.000Z".to_string());
        let doc = product.to_document().unwrap();
        assert_eq!(doc["createdAt"], json!("2026-10-18T00:00:00.000Z"));
        assert!(!doc.contains_key("updatedAt"));
        assert_eq!(doc["image"], Value::Null);
        assert_eq!(doc["variations"], json!({"colors": [], "sizes": [], "materials": []}));
    }

    #[test]
    fn test_from_document_fills_missing_fields() {
        let doc = json!({"id": "1", "name": "Casco", "price": 900000, "extra": true});
        let product = Product::from_document(doc.as_object().unwrap().clone()).unwrap();
        assert_eq!(product.name, "Casco");
        assert_eq!(product.price, 900000.0);
        assert_eq!(product.category, "tactical");
        assert!(product.active);
    }

    #[test]
    fn test_patch_apply_overrides_only_set_fields() {
        let base = Product {
            image: Some(json!({"data": {"display_url": "x"}})),
            ..boots()
        };
        let patch = ProductPatch {
            stock: Some(9),
            featured: Some(true),
            ..ProductPatch::default()
        };
        let merged = patch.apply(&base);
        assert_eq!(merged.stock, 9);
        assert!(merged.featured);
        assert_eq!(merged.name, "Botas");
        assert!(merged.has_image());

        let cleared = ProductPatch {
            image: Some(None),
            ..ProductPatch::default()
        }
        .apply(&base);
        assert!(!cleared.has_image());
    }

    #[test]
    fn test_patch_json() {
        let patch: ProductPatch =
            serde_json::from_value(json!({"image": null, "stock": 3})).unwrap();
        assert_eq!(patch.image, Some(None));
        assert_eq!(patch.stock, Some(3));
        assert_eq!(
            Value::Object(patch.to_document().unwrap()),
            json!({"image": null, "stock": 3})
        );

        let untouched: ProductPatch = serde_json::from_value(json!({"stock": 3})).unwrap();
        assert_eq!(untouched.image, None);

        assert!(serde_json::from_value::<ProductPatch>(json!({"id": "other"})).is_err());
        assert!(ProductPatch::default().is_empty());
    }
}
