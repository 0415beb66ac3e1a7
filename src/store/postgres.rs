use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CatalogStore, OrderStore, StoreHealth};
use crate::{
    database,
    error::Result,
    models::{
        NewOrder, NewProduct, Order, OrderChanges, OrderQuery, Product, ProductChanges, ProductQuery,
    },
    queries::{order_queries, product_queries},
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        product_queries::find_by_id(&self.pool, id).await
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        product_queries::search_products(&self.pool, query).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        product_queries::create_product(&self.pool, &product).await
    }

    async fn update_product(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>> {
        product_queries::update_product(&self.pool, id, changes).await
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(product_queries::delete_product(&self.pool, id).await? > 0)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        order_queries::create_order_with_lines(&self.pool, &order).await
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        order_queries::find_by_id(&self.pool, id).await
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        order_queries::search_orders(&self.pool, query).await
    }

    async fn update_order(&self, id: Uuid, changes: &OrderChanges) -> Result<Option<Order>> {
        order_queries::update_order(&self.pool, id, changes).await
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        Ok(order_queries::delete_order(&self.pool, id).await? > 0)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn check_health(&self) -> Result<()> {
        database::check_health(&self.pool).await
    }
}
