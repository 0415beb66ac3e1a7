//! Persistence seams. Services only talk to these traits; `PgStore` backs them
//! with Postgres and `MemoryStore` keeps everything in process.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        NewOrder, NewProduct, Order, OrderChanges, OrderQuery, Product, ProductChanges, ProductQuery,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalizes `limit`/`offset` query parameters.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Returns `None` if the product does not exist.
    async fn update_product(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>>;

    async fn delete_product(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order and all of its lines, or nothing.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    async fn update_order(&self, id: Uuid, changes: &OrderChanges) -> Result<Option<Order>>;

    async fn delete_order(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn check_health(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_apply_defaults_and_caps() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(1000), Some(5)), (MAX_PAGE_SIZE, 5));
        assert_eq!(page_bounds(Some(0), Some(-3)), (1, 0));
    }
}
