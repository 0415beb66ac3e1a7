use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{CatalogStore, OrderStore, StoreHealth, page_bounds};
use crate::{
    error::Result,
    models::{
        NewOrder, NewProduct, Order, OrderChanges, OrderQuery, Product, ProductChanges, ProductQuery,
    },
};

#[derive(Debug)]
struct Entry<T> {
    seq: u64,
    value: T,
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: DashMap<Uuid, Entry<Product>>,
    orders: DashMap<Uuid, Entry<Order>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Newest first, then paginated.
fn paginate<T: Clone>(
    mut rows: Vec<(u64, chrono::DateTime<Utc>, T)>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Vec<T> {
    let (limit, offset) = page_bounds(limit, offset);
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(|(_, _, value)| value)
        .collect()
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.get(&id).map(|entry| entry.value.clone()))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let rows = self
            .products
            .iter()
            .filter(|entry| match &needle {
                Some(needle) => contains_ignore_case(&entry.value.name, needle),
                None => true,
            })
            .map(|entry| (entry.seq, entry.value.created_at, entry.value.clone()))
            .collect();

        Ok(paginate(rows, query.limit, query.offset))
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            image_ref: product.image_ref,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };

        self.products.insert(
            product.id,
            Entry {
                seq: self.next_seq(),
                value: product.clone(),
            },
        );

        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>> {
        Ok(self.products.get_mut(&id).map(|mut entry| {
            entry.value.apply(changes);
            entry.value.updated_at = Utc::now();
            entry.value.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(self.products.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            ordered_products: order.ordered_products,
            total_amount: order.total_amount,
            status: order.status,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };

        self.orders.insert(
            order.id,
            Entry {
                seq: self.next_seq(),
                value: order.clone(),
            },
        );

        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.get(&id).map(|entry| entry.value.clone()))
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let rows = self
            .orders
            .iter()
            .filter(|entry| query.status.is_none_or(|status| entry.value.status == status))
            .filter(|entry| match &needle {
                Some(needle) => {
                    contains_ignore_case(&entry.value.customer_name, needle)
                        || contains_ignore_case(&entry.value.customer_email, needle)
                        || entry.value.id.to_string().contains(needle.as_str())
                }
                None => true,
            })
            .map(|entry| (entry.seq, entry.value.created_at, entry.value.clone()))
            .collect();

        Ok(paginate(rows, query.limit, query.offset))
    }

    async fn update_order(&self, id: Uuid, changes: &OrderChanges) -> Result<Option<Order>> {
        Ok(self.orders.get_mut(&id).map(|mut entry| {
            entry.value.apply(changes);
            entry.value.updated_at = Utc::now();
            entry.value.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::models::{OrderLineSnapshot, OrderStatus};

    fn new_order(name: &str, email: &str) -> NewOrder {
        NewOrder {
            customer_name: name.to_string(),
            customer_email: email.to_string(),
            customer_phone: None,
            ordered_products: vec![OrderLineSnapshot {
                name_snapshot: "Taza".to_string(),
                price_snapshot: dec!(4.00),
                quantity: 1,
            }],
            total_amount: dec!(4.00),
            status: OrderStatus::Recibido,
        }
    }

    #[tokio::test]
    async fn lists_orders_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert_order(new_order("Ana", "ana@x.com")).await.unwrap();
        let second = store.insert_order(new_order("Luis", "luis@x.com")).await.unwrap();

        let orders = store.list_orders(&OrderQuery::default()).await.unwrap();
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn searches_orders_by_customer_fields() {
        let store = MemoryStore::new();
        store.insert_order(new_order("Ana", "ana@x.com")).await.unwrap();
        let luis = store.insert_order(new_order("Luis", "luis@y.com")).await.unwrap();

        let query = OrderQuery {
            search: Some("Y.COM".to_string()),
            ..Default::default()
        };
        let found = store.list_orders(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, luis.id);

        let by_id = OrderQuery {
            search: Some(luis.id.to_string()[..8].to_string()),
            ..Default::default()
        };
        assert_eq!(store.list_orders(&by_id).await.unwrap()[0].id, luis.id);
    }

    #[tokio::test]
    async fn filters_orders_by_status() {
        let store = MemoryStore::new();
        let order = store.insert_order(new_order("Ana", "ana@x.com")).await.unwrap();
        store.insert_order(new_order("Luis", "luis@x.com")).await.unwrap();

        let changes = OrderChanges {
            status: Some(OrderStatus::Entregado),
            ..Default::default()
        };
        store.update_order(order.id, &changes).await.unwrap();

        let query = OrderQuery {
            status: Some(OrderStatus::Entregado),
            ..Default::default()
        };
        let delivered = store.list_orders(&query).await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, order.id);
    }

    #[tokio::test]
    async fn update_of_missing_rows_returns_none() {
        let store = MemoryStore::new();
        assert!(
            store
                .update_order(Uuid::new_v4(), &OrderChanges::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .update_product(Uuid::new_v4(), &ProductChanges::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn paginates_products() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .insert_product(NewProduct {
                    name: format!("Producto {}", i),
                    description: None,
                    price: dec!(1.00),
                    image_ref: format!("media/{}.png", i),
                    stock: 0,
                })
                .await
                .unwrap();
        }

        let query = ProductQuery {
            search: None,
            limit: Some(2),
            offset: Some(1),
        };
        let page = store.list_products(&query).await.unwrap();
        let names: Vec<&str> = page.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Producto 3", "Producto 2"]);
    }
}
