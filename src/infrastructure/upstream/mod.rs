//! Upstream - 上游题库适配器

mod http_catalog;

pub use http_catalog::{HttpCatalogClient, HttpCatalogClientConfig};
