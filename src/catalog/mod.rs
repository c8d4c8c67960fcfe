//! The product catalog: domain types, validation, the service facade and seed data.

pub mod product;
pub mod seed;
pub mod service;
pub mod vocabulary;

pub use product::{default_product, validate_product, Product, ProductPatch, ValidationErrors, Variations};
pub use seed::seed_catalog;
pub use service::{ProductService, SearchCriteria, DEFAULT_FEATURED_LIMIT};
