use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{NewOrder, Order, OrderChanges, OrderLineSnapshot, OrderQuery, OrderStatus},
    store::page_bounds,
};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    total_amount: Decimal,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    order_id: Uuid,
    name_snapshot: String,
    price_snapshot: Decimal,
    quantity: i32,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLineSnapshot>) -> Result<Order> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            AppError::InternalError(format!("Order {} has corrupt status: {}", self.id, e))
        })?;

        Ok(Order {
            id: self.id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            ordered_products: lines,
            total_amount: self.total_amount,
            status,
            admin_notes: self.admin_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<OrderLineRow> for OrderLineSnapshot {
    fn from(row: OrderLineRow) -> Self {
        Self {
            name_snapshot: row.name_snapshot,
            price_snapshot: row.price_snapshot,
            quantity: row.quantity,
        }
    }
}

async fn lines_for_orders<'e, E>(
    executor: E,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderLineSnapshot>>>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, OrderLineRow>(
        "SELECT order_id, name_snapshot, price_snapshot, quantity
         FROM order_lines
         WHERE order_id = ANY($1)
         ORDER BY order_id, position",
    )
    .bind(order_ids)
    .fetch_all(executor)
    .await?;

    let mut lines_map: HashMap<Uuid, Vec<OrderLineSnapshot>> = HashMap::new();
    for row in rows {
        lines_map.entry(row.order_id).or_default().push(row.into());
    }

    Ok(lines_map)
}

fn assemble(
    rows: Vec<OrderRow>,
    mut lines_map: HashMap<Uuid, Vec<OrderLineSnapshot>>,
) -> Result<Vec<Order>> {
    rows.into_iter()
        .map(|row| {
            let lines = lines_map.remove(&row.id).unwrap_or_default();
            row.into_order(lines)
        })
        .collect()
}

pub async fn create_order_with_lines(pool: &PgPool, order: &NewOrder) -> Result<Order> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (id, customer_name, customer_email, customer_phone, total_amount, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(order.total_amount)
    .bind(order.status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let positions: Vec<i32> = (0..order.ordered_products.len() as i32).collect();
    let names: Vec<&str> = order
        .ordered_products
        .iter()
        .map(|line| line.name_snapshot.as_str())
        .collect();
    let prices: Vec<Decimal> = order
        .ordered_products
        .iter()
        .map(|line| line.price_snapshot)
        .collect();
    let quantities: Vec<i32> = order
        .ordered_products
        .iter()
        .map(|line| line.quantity)
        .collect();

    sqlx::query(
        "INSERT INTO order_lines (order_id, position, name_snapshot, price_snapshot, quantity)
         SELECT $1, unnest($2::int[]), unnest($3::text[]), unnest($4::numeric[]), unnest($5::int[])",
    )
    .bind(row.id)
    .bind(&positions)
    .bind(&names)
    .bind(&prices)
    .bind(&quantities)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    row.into_order(order.ordered_products.clone())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut lines_map = lines_for_orders(pool, &[id]).await?;
    let lines = lines_map.remove(&id).unwrap_or_default();

    row.into_order(lines).map(Some)
}

pub async fn search_orders(pool: &PgPool, params: &OrderQuery) -> Result<Vec<Order>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM orders WHERE 1=1");

    if let Some(status) = params.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }

    if let Some(ref q) = params.search {
        let pattern = format!("%{}%", q);
        query.push(" AND (customer_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR customer_email ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR id::text ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    let (limit, offset) = page_bounds(params.limit, params.offset);

    query.push(" ORDER BY created_at DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows = query.build_query_as::<OrderRow>().fetch_all(pool).await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let lines_map = lines_for_orders(pool, &order_ids).await?;

    assemble(rows, lines_map)
}

async fn update_quantities(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    quantities: &[i32],
) -> Result<()> {
    let positions: Vec<i32> = (0..quantities.len() as i32).collect();

    sqlx::query(
        "UPDATE order_lines AS l
         SET quantity = q.quantity
         FROM (SELECT unnest($2::int[]) AS position, unnest($3::int[]) AS quantity) AS q
         WHERE l.order_id = $1 AND l.position = q.position",
    )
    .bind(order_id)
    .bind(&positions)
    .bind(quantities)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn update_order(
    pool: &PgPool,
    id: Uuid,
    changes: &OrderChanges,
) -> Result<Option<Order>> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        UPDATE orders
        SET
            customer_name = COALESCE($1, customer_name),
            customer_email = COALESCE($2, customer_email),
            customer_phone = CASE WHEN $3 THEN $4 ELSE customer_phone END,
            total_amount = COALESCE($5, total_amount),
            status = COALESCE($6, status),
            admin_notes = CASE WHEN $7 THEN $8 ELSE admin_notes END,
            updated_at = NOW()
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(&changes.customer_name)
    .bind(&changes.customer_email)
    .bind(changes.customer_phone.is_some())
    .bind(changes.customer_phone.clone().flatten())
    .bind(changes.total_amount)
    .bind(changes.status.map(|status| status.as_str()))
    .bind(changes.admin_notes.is_some())
    .bind(changes.admin_notes.clone().flatten())
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Ok(None);
    };

    if let Some(ref quantities) = changes.quantities {
        update_quantities(&mut tx, id, quantities).await?;
    }

    let mut lines_map = lines_for_orders(&mut *tx, &[id]).await?;
    tx.commit().await?;

    let lines = lines_map.remove(&id).unwrap_or_default();
    row.into_order(lines).map(Some)
}

pub async fn delete_order(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
