use async_trait::async_trait;

use stockroom_core::{CategoryId, DomainResult, Page, ProductId};

use crate::product::{NewProduct, Product, ProductCategory, ProductQuery, ProductSummary, ProductUpdate};

/// Persistence and business logic behind the products endpoints.
///
/// Callers validate input before delegating; implementations may assume ids
/// referenced by a request existed at validation time.
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// One page of live products matching the filters, plus the total match count.
    async fn get_products(&self, query: ProductQuery) -> DomainResult<Page<Product>>;

    async fn get_product_categories(&self) -> DomainResult<Vec<ProductCategory>>;

    /// Minified projection of every live product.
    async fn get_products_list(&self) -> DomainResult<Vec<ProductSummary>>;

    async fn get_product_by_id(&self, id: ProductId) -> DomainResult<Option<Product>>;

    /// Soft-delete; returns the number of rows affected.
    async fn delete_product_by_id(&self, id: ProductId) -> DomainResult<u64>;

    async fn post_product(&self, product: NewProduct) -> DomainResult<Product>;

    async fn update_product(&self, update: ProductUpdate) -> DomainResult<Product>;

    /// Apply a signed stock delta.
    async fn update_product_stock(&self, id: ProductId, amount: i64) -> DomainResult<Product>;

    async fn post_product_category(&self, name: String) -> DomainResult<ProductCategory>;

    async fn update_product_category(
        &self,
        name: String,
        id: CategoryId,
    ) -> DomainResult<ProductCategory>;

    /// Soft-delete; returns the number of rows affected.
    async fn delete_product_category_by_id(&self, id: CategoryId) -> DomainResult<u64>;
}
